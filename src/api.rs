//! HTTP handlers for submitting and listing review analyses.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::analyzer::ReviewAnalyzer;
use crate::db::{self, ReviewRecord};

pub struct AppState {
    pub pool: PgPool,
    pub analyzer: ReviewAnalyzer,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// Free-text product review
    #[schema(example = "Baterainya awet, tapi harganya agak mahal")]
    pub review: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyzeResponse {
    pub message: String,
    pub result: ReviewRecord,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/analyze-review", post(analyze_review))
        .route("/api/reviews", get(list_reviews))
        .with_state(state)
}

/// Analyse a review and store the result
#[utoipa::path(
    post,
    path = "/api/analyze-review",
    request_body = AnalyzeRequest,
    responses(
        (status = 201, description = "Analysis stored", body = AnalyzeResponse),
        (status = 400, description = "Review text missing or body not a JSON object", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "reviews"
)]
pub async fn analyze_review(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<(StatusCode, Json<AnalyzeResponse>), ApiError> {
    // Only a JSON object is accepted; arrays and scalars never reach the struct.
    let Json(body) = payload.map_err(|rejection| {
        tracing::warn!("⚠️ Rejected analysis request: {}", rejection.body_text());
        api_error(StatusCode::BAD_REQUEST, rejection.body_text())
    })?;
    let req: AnalyzeRequest = serde_json::from_value(Value::Object(body))
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, "Review text is required"))?;

    let review = match req.review {
        Some(review) if !review.trim().is_empty() => review,
        _ => return Err(api_error(StatusCode::BAD_REQUEST, "Review text is required")),
    };

    let analysis = state.analyzer.analyze(&review).await;

    let record = db::insert_review(&state.pool, &review, &analysis.sentiment, &analysis.key_points)
        .await
        .map_err(|e| {
            tracing::error!("🔥 Error saving analysis: {:#}", e);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal Server Error: {}", e),
            )
        })?;

    Ok((
        StatusCode::CREATED,
        Json(AnalyzeResponse {
            message: "Analysis successful and saved".to_string(),
            result: record,
        }),
    ))
}

/// List stored analyses, newest first
#[utoipa::path(
    get,
    path = "/api/reviews",
    responses(
        (status = 200, description = "Stored analyses", body = [ReviewRecord]),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "reviews"
)]
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ReviewRecord>>, ApiError> {
    let reviews = db::list_reviews(&state.pool).await.map_err(|e| {
        tracing::error!("🔥 Error fetching reviews: {:#}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch reviews")
    })?;

    Ok(Json(reviews))
}
