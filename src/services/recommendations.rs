use crate::{
    db::RecommendationStore,
    error::{AppError, AppResult},
    models::{
        GenerateRequest, NewRecommendation, ProductRecord, Recommendation, RecommendationFilter,
        RecommendationPayload, RecommendationType, ScoreRequest, ScoredRecommendations,
    },
    services::{
        collection::{CollectionError, RecommendationCollection, SortOrder},
        weighting::{WeightRule, WeightingEngine},
    },
};
use serde_json::Value;
use std::collections::BTreeSet;

/// Lists stored recommendations, optionally narrowed by type name and product
///
/// A type name that matches no active type is reported as not found rather
/// than silently returning everything.
pub async fn list_recommendations(
    store: &dyn RecommendationStore,
    type_name: Option<&str>,
    product_id: Option<i64>,
) -> AppResult<Vec<Recommendation>> {
    let rec_type_id = match type_name {
        Some(name) => {
            let rec_type = store.find_active_type_by_name(name).await?.ok_or_else(|| {
                AppError::NotFound(format!("Recommendations with type '{}' was not found.", name))
            })?;
            Some(rec_type.id)
        }
        None => None,
    };

    store
        .list_recommendations(RecommendationFilter {
            product_id,
            rec_type_id,
        })
        .await
}

pub async fn get_recommendation(
    store: &dyn RecommendationStore,
    id: i32,
) -> AppResult<Recommendation> {
    store
        .find_recommendation(id)
        .await?
        .ok_or_else(|| recommendation_not_found(id))
}

pub async fn create_recommendation(
    store: &dyn RecommendationStore,
    payload: RecommendationPayload,
) -> AppResult<Recommendation> {
    let new = NewRecommendation::try_from(payload)?;
    let recommendation = store.create_recommendation(new).await?;

    tracing::info!(
        id = recommendation.id,
        product_id = recommendation.product_id,
        rec_product_id = recommendation.rec_product_id,
        "Created recommendation"
    );

    Ok(recommendation)
}

pub async fn update_recommendation(
    store: &dyn RecommendationStore,
    id: i32,
    payload: RecommendationPayload,
) -> AppResult<Recommendation> {
    let changes = NewRecommendation::try_from(payload)?;
    store
        .update_recommendation(id, changes)
        .await?
        .ok_or_else(|| recommendation_not_found(id))
}

pub async fn delete_recommendation(store: &dyn RecommendationStore, id: i32) -> AppResult<()> {
    if !store.delete_recommendation(id).await? {
        return Err(recommendation_not_found(id));
    }

    tracing::info!(id, "Deleted recommendation");
    Ok(())
}

pub async fn reset_recommendations(store: &dyn RecommendationStore) -> AppResult<()> {
    store.remove_all_recommendations().await
}

/// Activates or deactivates a recommendation type
pub async fn set_type_active(
    store: &dyn RecommendationStore,
    type_id: i32,
    active: bool,
) -> AppResult<RecommendationType> {
    let rec_type = store.set_type_active(type_id, active).await?.ok_or_else(|| {
        AppError::NotFound(format!("Recommendations with type '{}' was not found.", type_id))
    })?;

    tracing::info!(type_id, name = %rec_type.name, active, "Recommendation type updated");

    Ok(rec_type)
}

/// Ranks candidate products against a source product
///
/// Without a selector the symmetric affinity rule applies; a selector picks
/// the matching rule set. Candidates whose id was already seen are skipped
/// and listed in `duplicates`.
pub fn score_candidates(request: &ScoreRequest) -> AppResult<ScoredRecommendations> {
    let source = ProductRecord::from_value(&request.source)?;

    match request.rec_type_id {
        None => rank(
            RecommendationCollection::new(source),
            &request.candidates,
            request.order,
        ),
        Some(rec_type_id) => {
            let engine = WeightingEngine::new(source, rec_type_id)?;
            rank(
                RecommendationCollection::from(engine),
                &request.candidates,
                request.order,
            )
        }
    }
}

fn rank<R: WeightRule>(
    mut collection: RecommendationCollection<R>,
    candidates: &[Value],
    order: SortOrder,
) -> AppResult<ScoredRecommendations> {
    let mut duplicates = Vec::new();

    for raw in candidates {
        let candidate = ProductRecord::from_value(raw)?;

        match collection.insert(candidate) {
            Ok(_) => {}
            Err(CollectionError::DuplicateCandidate(id)) => {
                tracing::warn!(
                    source_id = %collection.owner().id,
                    candidate_id = %id,
                    "Skipping duplicate candidate"
                );
                duplicates.push(id);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let (source, recommendations) = collection.into_parts(order)?;

    tracing::debug!(
        source_id = %source.id,
        scored = recommendations.len(),
        duplicates = duplicates.len(),
        "Scored candidates"
    );

    Ok(ScoredRecommendations {
        source,
        recommendations,
        duplicates,
    })
}

/// Scores candidates with the selected rule set and stores one
/// recommendation per accepted candidate, highest weight first
///
/// Every id must be an integer; this is checked before anything is written.
pub async fn generate_recommendations(
    store: &dyn RecommendationStore,
    request: GenerateRequest,
) -> AppResult<Vec<Recommendation>> {
    let scored = score_candidates(&ScoreRequest {
        source: request.source,
        candidates: request.candidates,
        rec_type_id: Some(request.rec_type_id),
        order: SortOrder::Weight,
    })?;

    if store.find_type(request.rec_type_id).await?.is_none() {
        return Err(AppError::InvalidInput(format!(
            "Recommendation type {} does not exist",
            request.rec_type_id
        )));
    }

    let product_id = storable_id(&scored.source)?;

    // Distinct ids such as `2` and `"2"` collapse to one stored product;
    // the higher-weighted candidate wins.
    let mut seen = BTreeSet::new();
    let mut rows = Vec::with_capacity(scored.recommendations.len());
    let mut collapsed = Vec::new();
    for candidate in &scored.recommendations {
        let rec_product_id = storable_id(candidate)?;
        if !seen.insert(rec_product_id) {
            collapsed.push(candidate.id.clone());
            continue;
        }
        rows.push(NewRecommendation {
            product_id,
            rec_type_id: request.rec_type_id,
            rec_product_id,
            weight: candidate.weight.unwrap_or_default(),
        });
    }

    if !collapsed.is_empty() {
        tracing::warn!(
            product_id,
            candidates = ?collapsed,
            "Skipping candidates that store under an already used product id"
        );
    }

    let mut created = Vec::with_capacity(rows.len());
    for row in rows {
        created.push(store.create_recommendation(row).await?);
    }

    tracing::info!(
        product_id,
        rec_type_id = request.rec_type_id,
        created = created.len(),
        skipped = scored.duplicates.len() + collapsed.len(),
        "Generated recommendations"
    );

    Ok(created)
}

fn storable_id(product: &ProductRecord) -> AppResult<i64> {
    product.id.as_i64().ok_or_else(|| {
        AppError::InvalidInput(format!(
            "Product id '{}' must be an integer to be stored",
            product.id
        ))
    })
}

fn recommendation_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Recommendation with id '{}' was not found.", id))
}
