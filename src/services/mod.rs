pub mod collection;
pub mod recommendations;
pub mod weighting;

pub use collection::{CollectionError, RecommendationCollection, SortOrder};
pub use weighting::{AffinityRule, RecommendationKind, UpsellRule, WeightError, WeightRule, WeightingEngine};
