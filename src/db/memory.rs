use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{NewRecommendation, Recommendation, RecommendationFilter, RecommendationType},
};

use super::RecommendationStore;

/// Stored recommendation without its joined type
#[derive(Debug, Clone)]
struct Row {
    fields: NewRecommendation,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    types: BTreeMap<i32, RecommendationType>,
    recommendations: BTreeMap<i32, Row>,
}

impl Tables {
    fn join(&self, id: i32, row: &Row) -> Option<Recommendation> {
        let rec_type = self.types.get(&row.fields.rec_type_id)?.clone();
        Some(Recommendation {
            id,
            product_id: row.fields.product_id,
            rec_type,
            rec_product_id: row.fields.rec_product_id,
            weight: row.fields.weight,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn ensure_type_exists(&self, rec_type_id: i32) -> AppResult<()> {
        if !self.types.contains_key(&rec_type_id) {
            return Err(AppError::InvalidInput(format!(
                "Recommendation type {} does not exist",
                rec_type_id
            )));
        }
        Ok(())
    }
}

/// In-process store used by tests and `STORE_BACKEND=memory`
///
/// Seeded with the same recommendation types as the database migration.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    next_id: AtomicI32,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        let types = [("up-sell", true), ("accessory", true), ("cross-sell", false)]
            .into_iter()
            .zip(1..)
            .map(|((name, is_active), id)| {
                let rec_type = RecommendationType {
                    id,
                    name: name.to_string(),
                    is_active,
                    product_query: "category=values".to_string(),
                };
                (id, rec_type)
            })
            .collect();

        Self {
            tables: RwLock::new(Tables {
                types,
                recommendations: BTreeMap::new(),
            }),
            next_id: AtomicI32::new(1),
        }
    }
}

#[async_trait::async_trait]
impl RecommendationStore for InMemoryStore {
    async fn list_recommendations(
        &self,
        filter: RecommendationFilter,
    ) -> AppResult<Vec<Recommendation>> {
        let tables = self.tables.read().await;
        let active_only = filter.active_only();

        let recommendations = tables
            .recommendations
            .iter()
            .filter(|(_, row)| filter.product_id.map_or(true, |id| row.fields.product_id == id))
            .filter(|(_, row)| {
                filter
                    .rec_type_id
                    .map_or(true, |id| row.fields.rec_type_id == id)
            })
            .filter_map(|(id, row)| tables.join(*id, row))
            .filter(|rec| !active_only || rec.rec_type.is_active)
            .collect();

        Ok(recommendations)
    }

    async fn find_recommendation(&self, id: i32) -> AppResult<Option<Recommendation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .recommendations
            .get(&id)
            .and_then(|row| tables.join(id, row)))
    }

    async fn create_recommendation(&self, new: NewRecommendation) -> AppResult<Recommendation> {
        let mut tables = self.tables.write().await;
        tables.ensure_type_exists(new.rec_type_id)?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let row = Row {
            fields: new,
            created_at: now,
            updated_at: now,
        };

        let recommendation = tables
            .join(id, &row)
            .ok_or_else(|| AppError::Internal("recommendation type vanished".to_string()))?;
        tables.recommendations.insert(id, row);

        Ok(recommendation)
    }

    async fn update_recommendation(
        &self,
        id: i32,
        changes: NewRecommendation,
    ) -> AppResult<Option<Recommendation>> {
        let mut tables = self.tables.write().await;
        tables.ensure_type_exists(changes.rec_type_id)?;

        let Some(row) = tables.recommendations.get_mut(&id) else {
            return Ok(None);
        };
        row.fields = changes;
        row.updated_at = Utc::now();
        let row = row.clone();

        Ok(tables.join(id, &row))
    }

    async fn delete_recommendation(&self, id: i32) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.recommendations.remove(&id).is_some())
    }

    async fn remove_all_recommendations(&self) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.recommendations.clear();
        Ok(())
    }

    async fn find_type(&self, id: i32) -> AppResult<Option<RecommendationType>> {
        let tables = self.tables.read().await;
        Ok(tables.types.get(&id).cloned())
    }

    async fn find_active_type_by_name(&self, name: &str) -> AppResult<Option<RecommendationType>> {
        let name = name.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .types
            .values()
            .find(|t| t.name == name && t.is_active)
            .cloned())
    }

    async fn set_type_active(
        &self,
        id: i32,
        active: bool,
    ) -> AppResult<Option<RecommendationType>> {
        let mut tables = self.tables.write().await;
        Ok(tables.types.get_mut(&id).map(|rec_type| {
            rec_type.is_active = active;
            rec_type.clone()
        }))
    }
}
