//! API route definitions

use crate::handlers::{chat, health, predict, records};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create API routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Service endpoints
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        // Prediction endpoints
        .route("/predict", post(predict::predict))
        .route("/predict/csv", post(predict::predict_csv))
        .route("/predict/pdf", post(predict::predict_pdf))
        .route("/records", get(records::list_records))
        // Research assistant
        .route("/chat", post(chat::chat))
}
