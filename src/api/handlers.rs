use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    models::{
        GenerateRequest, Recommendation, RecommendationPayload, RecommendationType, ScoreRequest,
        ScoredRecommendations,
    },
    services::recommendations,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub id: i32,
    pub product_id: i64,
    pub rec_type: RecommendationType,
    pub rec_product_id: i64,
    pub weight: f64,
}

impl From<&Recommendation> for RecommendationResponse {
    fn from(rec: &Recommendation) -> Self {
        Self {
            id: rec.id,
            product_id: rec.product_id,
            rec_type: rec.rec_type.clone(),
            rec_product_id: rec.rec_product_id,
            weight: rec.weight,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub rec_type: Option<String>,
    pub product_id: Option<i64>,
}

fn location(rec: &Recommendation) -> String {
    format!("/recommendations/{}", rec.id)
}

// Handlers

/// Service name, version and a pointer to the listing
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": "Recommendation Demo REST API Service",
        "version": env!("CARGO_PKG_VERSION"),
        "url": "/recommendations",
    }))
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// List recommendations, optionally by `type` name and `product_id`
pub async fn list_recommendations(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Json<Vec<RecommendationResponse>>> {
    let Query(query) = query?;
    let recs = recommendations::list_recommendations(
        state.store.as_ref(),
        query.rec_type.as_deref(),
        query.product_id,
    )
    .await?;

    Ok(Json(recs.iter().map(RecommendationResponse::from).collect()))
}

pub async fn get_recommendation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<RecommendationResponse>> {
    let rec = recommendations::get_recommendation(state.store.as_ref(), id).await?;
    Ok(Json(RecommendationResponse::from(&rec)))
}

/// Create a recommendation; responds 201 with a `Location` header
pub async fn create_recommendation(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(body) = body?;
    let payload = RecommendationPayload::from_json(body)?;
    let rec = recommendations::create_recommendation(state.store.as_ref(), payload).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location(&rec))],
        Json(RecommendationResponse::from(&rec)),
    ))
}

pub async fn update_recommendation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Json(body) = body?;
    let payload = RecommendationPayload::from_json(body)?;
    let rec = recommendations::update_recommendation(state.store.as_ref(), id, payload).await?;
    Ok(Json(RecommendationResponse::from(&rec)))
}

pub async fn delete_recommendation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    recommendations::delete_recommendation(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove every stored recommendation; types are left untouched
pub async fn reset_recommendations(State(state): State<AppState>) -> AppResult<StatusCode> {
    recommendations::reset_recommendations(state.store.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn activate_type(
    State(state): State<AppState>,
    Path(type_id): Path<i32>,
) -> AppResult<Json<RecommendationType>> {
    let rec_type = recommendations::set_type_active(state.store.as_ref(), type_id, true).await?;
    Ok(Json(rec_type))
}

pub async fn deactivate_type(
    State(state): State<AppState>,
    Path(type_id): Path<i32>,
) -> AppResult<Json<RecommendationType>> {
    let rec_type = recommendations::set_type_active(state.store.as_ref(), type_id, false).await?;
    Ok(Json(rec_type))
}

/// Rank candidates against a source product without storing anything
pub async fn score_candidates(
    request: Result<Json<ScoreRequest>, JsonRejection>,
) -> AppResult<Json<ScoredRecommendations>> {
    let Json(request) = request?;
    let scored = recommendations::score_candidates(&request)?;
    Ok(Json(scored))
}

/// Score candidates and store the results as recommendations
pub async fn generate_recommendations(
    State(state): State<AppState>,
    request: Result<Json<GenerateRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Vec<RecommendationResponse>>)> {
    let Json(request) = request?;
    let created = recommendations::generate_recommendations(state.store.as_ref(), request).await?;

    Ok((
        StatusCode::CREATED,
        Json(created.iter().map(RecommendationResponse::from).collect()),
    ))
}
