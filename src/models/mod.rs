use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::collection::SortOrder;

pub mod product;
pub mod recommendation;

pub use product::{compare_by_weight, IncomparableValue, ParseError, ProductId, ProductRecord, Weighted};
pub use recommendation::{
    DataValidationError, NewRecommendation, Recommendation, RecommendationFilter,
    RecommendationPayload, RecommendationType,
};

/// Request to score candidate products against a source product
///
/// Metadata may be sent as an encoded JSON string or as an inline object.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub source: Value,
    #[serde(default)]
    pub candidates: Vec<Value>,
    /// Rule set selector; the symmetric affinity rule is used when absent
    #[serde(default)]
    pub rec_type_id: Option<i32>,
    #[serde(default)]
    pub order: SortOrder,
}

/// Request to score candidates and persist the results
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub source: Value,
    #[serde(default)]
    pub candidates: Vec<Value>,
    pub rec_type_id: i32,
}

/// Candidates ranked for a source product
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRecommendations {
    pub source: ProductRecord,
    pub recommendations: Vec<ProductRecord>,
    /// Candidate ids that were skipped because they were already present
    pub duplicates: Vec<ProductId>,
}
