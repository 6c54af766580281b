use thiserror::Error;

use crate::models::ProductRecord;

/// Maximum price gap (inclusive) for two products to count as similarly priced
pub const PRICE_AFFINITY_WINDOW: f64 = 5.00;

/// Selector id of the upsell rule set
pub const UPSELL_TYPE_ID: i32 = 1;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WeightError {
    #[error("Unsupported recommendation type: {0}")]
    UnsupportedRecommendationType(i32),
}

/// A heuristic rule set scoring a candidate against a source product
///
/// Implementations must be pure: the same pair always yields the same weight.
pub trait WeightRule {
    fn weigh(&self, source: &ProductRecord, candidate: &ProductRecord) -> u32;
}

/// Symmetric affinity: same category, and prices within `PRICE_AFFINITY_WINDOW`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AffinityRule;

impl WeightRule for AffinityRule {
    fn weigh(&self, source: &ProductRecord, candidate: &ProductRecord) -> u32 {
        let mut weight = 0;
        if source.category == candidate.category {
            weight += 1;
        }
        if (source.price - candidate.price).abs() <= PRICE_AFFINITY_WINDOW {
            weight += 1;
        }
        weight
    }
}

/// Upsell: same category, and the candidate costs more than the source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsellRule;

impl WeightRule for UpsellRule {
    fn weigh(&self, source: &ProductRecord, candidate: &ProductRecord) -> u32 {
        let mut weight = 0;
        if source.category == candidate.category {
            weight += 1;
        }
        if candidate.price > source.price {
            weight += 1;
        }
        weight
    }
}

/// Known recommendation type selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationKind {
    Upsell,
}

impl TryFrom<i32> for RecommendationKind {
    type Error = WeightError;

    fn try_from(rec_type_id: i32) -> Result<Self, Self::Error> {
        match rec_type_id {
            UPSELL_TYPE_ID => Ok(RecommendationKind::Upsell),
            other => Err(WeightError::UnsupportedRecommendationType(other)),
        }
    }
}

impl WeightRule for RecommendationKind {
    fn weigh(&self, source: &ProductRecord, candidate: &ProductRecord) -> u32 {
        match self {
            RecommendationKind::Upsell => UpsellRule.weigh(source, candidate),
        }
    }
}

/// Scores candidates against a fixed source product with a selected rule set
#[derive(Debug, Clone)]
pub struct WeightingEngine {
    source: ProductRecord,
    kind: RecommendationKind,
}

impl WeightingEngine {
    /// Fails with `UnsupportedRecommendationType` for unknown selectors
    pub fn new(source: ProductRecord, rec_type_id: i32) -> Result<Self, WeightError> {
        let kind = RecommendationKind::try_from(rec_type_id)?;
        Ok(Self { source, kind })
    }

    pub fn source(&self) -> &ProductRecord {
        &self.source
    }

    pub fn kind(&self) -> RecommendationKind {
        self.kind
    }

    pub fn into_source(self) -> ProductRecord {
        self.source
    }

    /// Weight of `candidate` relative to the source product
    pub fn weight(&self, candidate: &ProductRecord) -> u32 {
        self.kind.weigh(&self.source, candidate)
    }
}
