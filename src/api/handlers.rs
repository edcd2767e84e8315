//! Route handlers

use axum::Json;
use axum::extract::{Query, State};

use super::AppState;
use super::dto::{
    AnalyzeResponse, ApiResponse, CacheUpdateResponse, DetectionSummary, FeedbackRequest,
    FeedbackResponse, HealthResponse, LimitQuery, ReadyResponse, RecentQuery, RecentResponse,
};
use super::error::{ApiError, ApiResult};
use crate::pipeline::AnalysisRequest;
use crate::store::{FeedbackRecord, NewFeedback};

/// Upper bound on any listing page size
const MAX_PAGE_SIZE: u32 = 1000;
const DEFAULT_FEEDBACK_LIMIT: u32 = 50;

type Envelope<T> = Json<ApiResponse<T>>;

fn ok<T>(data: T) -> Envelope<T> {
    Json(ApiResponse::success(data))
}

/// Classify one URL
pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalysisRequest>,
) -> ApiResult<Envelope<AnalyzeResponse>> {
    let result = state
        .pipeline
        .analyze_with_deadline(&req.url, state.analyze_deadline)
        .await?;
    Ok(ok(result.into()))
}

/// Record a user's feedback on a past verdict
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> ApiResult<Envelope<FeedbackResponse>> {
    if req.url.trim().is_empty() {
        return Err(ApiError::BadRequest("url must not be empty".to_string()));
    }
    if !(0.0..=1.0).contains(&req.confidence) {
        return Err(ApiError::BadRequest("confidence must be within [0, 1]".to_string()));
    }

    let feedback_id = state
        .pipeline
        .store()
        .save_feedback(NewFeedback {
            url: req.url,
            is_correct: req.is_correct,
            detected_result: req.detected_result,
            confidence: req.confidence,
            user_comment: req.comment,
            metadata: req.metadata,
        })
        .await?;

    Ok(ok(FeedbackResponse {
        feedback_id,
        status: "success".to_string(),
    }))
}

/// Recent submissions, newest first
pub async fn list_feedback(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Envelope<Vec<FeedbackRecord>>> {
    let limit = query.limit.unwrap_or(DEFAULT_FEEDBACK_LIMIT).min(MAX_PAGE_SIZE);
    let feedback = state.pipeline.store().recent_feedback(limit).await?;
    Ok(ok(feedback))
}

/// Page through detections, newest first
pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Envelope<RecentResponse>> {
    let limit = query.limit.min(MAX_PAGE_SIZE);
    let store = state.pipeline.store();

    let records = store.recent_detections(limit, query.offset).await?;
    let total = store.count_detections().await?;

    Ok(ok(RecentResponse {
        urls: records.into_iter().map(DetectionSummary::from).collect(),
        total,
        offset: query.offset,
        limit,
    }))
}

/// Schedule a cache refresh and return at once
pub async fn update_cache(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Envelope<CacheUpdateResponse> {
    let limit = query
        .limit
        .unwrap_or(state.pipeline.config().refresh_limit);

    // detached: the job outlives this request
    drop(state.pipeline.spawn_refresh(limit));

    ok(CacheUpdateResponse {
        status: "scheduled".to_string(),
        limit,
    })
}

pub async fn health(State(state): State<AppState>) -> Envelope<HealthResponse> {
    ok(HealthResponse {
        status: "healthy".to_string(),
        service: "qshing-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.pipeline.scorer_name().to_string(),
    })
}

pub async fn ready(State(state): State<AppState>) -> ApiResult<Envelope<ReadyResponse>> {
    state
        .pipeline
        .scorer_ready()
        .map_err(|e| ApiError::NotReady(format!("Model not ready: {e}")))?;
    state
        .pipeline
        .store()
        .ping()
        .await
        .map_err(|e| ApiError::NotReady(format!("Store not ready: {e}")))?;

    Ok(ok(ReadyResponse {
        status: "ready".to_string(),
        model: state.pipeline.scorer_name().to_string(),
    }))
}
