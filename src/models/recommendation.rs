use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Raised when a request body cannot be turned into a recommendation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid recommendation: {0}")]
pub struct DataValidationError(pub String);

/// Lookup row naming a recommendation strategy (up-sell, accessory, ...)
#[derive(Debug, Clone, Serialize, PartialEq, Eq, sqlx::FromRow)]
pub struct RecommendationType {
    pub id: i32,
    pub name: String,
    pub is_active: bool,
    /// Catalog query used to fetch potential candidates for this type
    #[serde(skip_serializing)]
    pub product_query: String,
}

/// A stored recommendation: `rec_product_id` recommended for `product_id`
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub id: i32,
    pub product_id: i64,
    pub rec_type: RecommendationType,
    pub rec_product_id: i64,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for creating or replacing a recommendation
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecommendation {
    pub product_id: i64,
    pub rec_type_id: i32,
    pub rec_product_id: i64,
    pub weight: f64,
}

/// Request body for POST/PUT on a recommendation
///
/// Every field is optional at the serde level so that a missing key is
/// reported by name instead of as a generic decoding failure.
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationPayload {
    pub product_id: Option<i64>,
    pub rec_type_id: Option<i32>,
    pub rec_product_id: Option<i64>,
    pub weight: Option<f64>,
}

impl RecommendationPayload {
    /// Decodes a request body, reporting shape problems as validation errors
    pub fn from_json(body: Value) -> Result<Self, DataValidationError> {
        if !body.is_object() {
            return Err(DataValidationError(
                "body must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(body)
            .map_err(|e| DataValidationError(format!("bad or no data - {}", e)))
    }
}

impl TryFrom<RecommendationPayload> for NewRecommendation {
    type Error = DataValidationError;

    fn try_from(payload: RecommendationPayload) -> Result<Self, Self::Error> {
        fn missing(field: &str) -> DataValidationError {
            DataValidationError(format!("missing {}", field))
        }

        let product_id = payload.product_id.ok_or_else(|| missing("product_id"))?;
        let rec_type_id = payload.rec_type_id.ok_or_else(|| missing("rec_type_id"))?;
        let rec_product_id = payload
            .rec_product_id
            .ok_or_else(|| missing("rec_product_id"))?;
        let weight = payload.weight.ok_or_else(|| missing("weight"))?;
        if !weight.is_finite() {
            return Err(DataValidationError("weight must be finite".to_string()));
        }

        Ok(Self {
            product_id,
            rec_type_id,
            rec_product_id,
            weight,
        })
    }
}

/// Filters accepted when listing recommendations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecommendationFilter {
    pub product_id: Option<i64>,
    pub rec_type_id: Option<i32>,
}

impl RecommendationFilter {
    /// Filtered listings only ever include active recommendation types
    pub fn active_only(&self) -> bool {
        self.product_id.is_some() || self.rec_type_id.is_some()
    }
}
