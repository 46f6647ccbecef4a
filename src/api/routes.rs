use axum::{
    extract::{rejection::JsonRejection, Json, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::api::models::HealthResponse;
use crate::api::{response, ui};
use crate::error::{AppError, Result};
use crate::models::{SummaryRequest, SummaryResult};
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(ui::index))
        .route("/health", get(health_handler))
        .route("/api/summarize", post(summarize_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    response::success(HealthResponse {
        status: "ok".to_string(),
        model: state.summarizer.model_name().to_string(),
    })
}

async fn summarize_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SummaryRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "rejected request body");
            return AppError::InvalidRequest(rejection.body_text()).into_response();
        }
    };

    info!(url = %req.url, "processing summarize request");
    let start_time = Instant::now();

    // Set an overall timeout for the entire pipeline
    let timeout = state.config.request_timeout;
    let result = match tokio::time::timeout(timeout, process_summarize_request(&state, &req)).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(timeout)),
    };

    let elapsed = start_time.elapsed();
    match result {
        Ok(summary) => {
            info!(url = %req.url, ?elapsed, "summarize request succeeded");
            response::success(summary).into_response()
        }
        Err(err) => {
            match &err {
                AppError::Config(_) => error!(url = %req.url, kind = err.kind(), error = %err, ?elapsed, "summarize request failed"),
                _ => warn!(url = %req.url, kind = err.kind(), error = %err, ?elapsed, "summarize request failed"),
            }
            err.into_response()
        }
    }
}

async fn process_summarize_request(state: &AppState, req: &SummaryRequest) -> Result<SummaryResult> {
    req.validate()?;
    state.summarizer.summarize(req).await
}
