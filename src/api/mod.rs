//! HTTP surface
//!
//! | Route | Handler |
//! |---|---|
//! | `POST /phishing-detection/analyze` | classify a URL |
//! | `POST /phishing-detection/feedback` | record user feedback |
//! | `GET /phishing-detection/feedback` | list recent feedback |
//! | `GET /phishing-detection/recent` | page through detections |
//! | `POST /phishing-detection/update-cache` | schedule a cache refresh |
//! | `GET /health`, `GET /ready` | health checks |

mod dto;
mod error;
mod handlers;

pub use dto::{
    AnalyzeResponse, ApiResponse, CacheUpdateResponse, DetectionSummary, FeedbackRequest,
    FeedbackResponse, HealthResponse, ReadyResponse, RecentResponse,
};
pub use error::{ApiError, ApiResult};

use std::time::Duration;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::pipeline::DecisionPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: DecisionPipeline,
    pub analyze_deadline: Duration,
}

impl AppState {
    pub fn new(pipeline: DecisionPipeline, analyze_deadline: Duration) -> Self {
        Self {
            pipeline,
            analyze_deadline,
        }
    }
}

/// Create the router with all routes and layers
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    let detection_routes = Router::new()
        .route("/analyze", post(handlers::analyze))
        .route(
            "/feedback",
            post(handlers::submit_feedback).get(handlers::list_feedback),
        )
        .route("/recent", get(handlers::recent))
        .route("/update-cache", post(handlers::update_cache));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .nest("/phishing-detection", detection_routes)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}
