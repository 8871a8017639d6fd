//! HTTP surface: the extraction endpoint and a health check.
//!
//! Handlers stay thin — validation, one call into [`crate::extract`], and
//! envelope assembly. Every response body carries the `is_success`
//! discriminator so clients branch on one field regardless of status code.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ExtractionConfig;
use crate::extract;
use crate::model::VisionModel;
use crate::output::ExtractionData;
use crate::usage::TokenUsage;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn VisionModel>,
    pub config: Arc<ExtractionConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub document: Option<String>,
}

#[derive(Serialize)]
struct ExtractResponse {
    is_success: bool,
    token_usage: TokenUsage,
    data: ExtractionData,
}

#[derive(Serialize)]
struct ErrorResponse {
    is_success: bool,
    message: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    message: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            is_success: false,
            message: message.into(),
        }),
    )
        .into_response()
}

/// `POST /extract-bill-data`
///
/// An absent or unreadable body counts as a missing document URL: the
/// validation failure is surfaced before any extraction work starts.
async fn extract_bill_data(
    State(state): State<AppState>,
    payload: Option<Json<ExtractRequest>>,
) -> Response {
    let document = payload
        .as_ref()
        .and_then(|Json(request)| request.document.as_deref())
        .filter(|s| !s.is_empty());

    let Some(document) = document else {
        return error_response(StatusCode::BAD_REQUEST, "Document URL is required");
    };

    match extract::extract_bill(&*state.model, document, &state.config).await {
        Ok(result) => (
            StatusCode::OK,
            Json(ExtractResponse {
                is_success: true,
                token_usage: result.token_usage,
                data: result.data,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error in extract-bill-data: {}", e);
            let message = e.to_string();
            let message = if message.is_empty() {
                "Failed to process document. Internal server error occurred".to_string()
            } else {
                message
            };
            error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

/// `GET /health`
async fn health_handler() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            message: "Bill Extraction API is running".to_string(),
        }),
    )
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .route("/extract-bill-data", post(extract_bill_data))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
