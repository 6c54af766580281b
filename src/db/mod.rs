pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{create_pool, run_migrations, PgRecommendationStore};

use crate::{
    error::AppResult,
    models::{NewRecommendation, Recommendation, RecommendationFilter, RecommendationType},
};

/// Persistence for recommendations and the recommendation type lookup table
///
/// Stores own id generation. Listing results are ordered by ascending id.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    async fn list_recommendations(
        &self,
        filter: RecommendationFilter,
    ) -> AppResult<Vec<Recommendation>>;

    async fn find_recommendation(&self, id: i32) -> AppResult<Option<Recommendation>>;

    /// Fails with `InvalidInput` when `rec_type_id` names no known type
    async fn create_recommendation(&self, new: NewRecommendation) -> AppResult<Recommendation>;

    /// Replaces every field of an existing recommendation; `None` if absent
    async fn update_recommendation(
        &self,
        id: i32,
        changes: NewRecommendation,
    ) -> AppResult<Option<Recommendation>>;

    /// Returns whether a row was removed
    async fn delete_recommendation(&self, id: i32) -> AppResult<bool>;

    async fn remove_all_recommendations(&self) -> AppResult<()>;

    async fn find_type(&self, id: i32) -> AppResult<Option<RecommendationType>>;

    /// Case-insensitive lookup among active types only
    async fn find_active_type_by_name(&self, name: &str) -> AppResult<Option<RecommendationType>>;

    async fn set_type_active(
        &self,
        id: i32,
        active: bool,
    ) -> AppResult<Option<RecommendationType>>;
}
