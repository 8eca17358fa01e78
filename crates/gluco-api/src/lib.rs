//! Gluco API - REST server
//!
//! HTTP endpoints for diabetes risk prediction from structured input, CSV
//! datasets and PDF reports, plus prediction history and a research chat.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod telemetry;

#[cfg(feature = "test-utils")]
pub mod testing;

use axum::{extract::DefaultBodyLimit, http::HeaderValue, http::Method, Router};
use gluco_core::ServerConfig;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[cfg(feature = "test-utils")]
pub use testing::create_router_for_testing;

/// OpenAPI document
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gluco API",
        description = "Diabetes risk prediction from structured vitals, CSV datasets and PDF reports"
    ),
    paths(
        handlers::health::root,
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::health::metrics,
        handlers::predict::predict,
        handlers::predict::predict_csv,
        handlers::predict::predict_pdf,
        handlers::records::list_records,
        handlers::chat::chat,
    ),
    components(schemas(
        gluco_core::PatientInput,
        gluco_core::PatientRecord,
        handlers::health::RootResponse,
        handlers::health::HealthResponse,
        handlers::health::ReadinessResponse,
        handlers::health::ReadinessChecks,
        handlers::health::MetricsResponse,
        handlers::predict::PredictionResponse,
        handlers::predict::BatchPredictionResponse,
        handlers::predict::DocumentPredictionResponse,
        handlers::predict::UploadForm,
        handlers::chat::ChatRequest,
        handlers::chat::ChatResponse,
        error::ApiError,
    )),
    tags(
        (name = "health", description = "Service status"),
        (name = "predict", description = "Diabetes risk prediction"),
        (name = "records", description = "Prediction history"),
        (name = "chat", description = "Diabetes research assistant"),
    )
)]
pub struct ApiDoc;

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if !config.cors_enabled {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;
    let cors = cors_layer(server);
    let body_limit = DefaultBodyLimit::max(server.max_body_size);

    routes::api_routes()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
