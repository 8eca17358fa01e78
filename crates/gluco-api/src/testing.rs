//! Test utilities for integration tests
//!
//! Builds routers over an in-memory record store, with deterministic
//! stand-ins for the model and the LLM.

use crate::{create_router, state::AppState};
use async_trait::async_trait;
use axum::Router;
use gluco_core::{
    AppConfig, ChatMessage, FeatureField, FeatureVector, GlucoError, LlmClient, Predictor,
    Result, SqliteRecordStore,
};
use gluco_research::ResearchAssistant;
use std::sync::Arc;

/// Glucose above this value is labelled positive
pub const GLUCOSE_CUTOFF: f64 = 140.0;

/// Labels a sample positive when glucose exceeds [`GLUCOSE_CUTOFF`]
pub struct GlucoseCutoffPredictor;

impl Predictor for GlucoseCutoffPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<u8> {
        Ok(u8::from(features.get(FeatureField::Glucose) > GLUCOSE_CUTOFF))
    }

    fn name(&self) -> &str {
        "glucose-cutoff"
    }
}

/// Echoes the last user message back
pub struct EchoLlm;

#[async_trait]
impl LlmClient for EchoLlm {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        messages
            .last()
            .map(|m| format!("echo: {}", m.content))
            .ok_or_else(|| GlucoError::LlmError("empty conversation".to_string()))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Application state over an in-memory store
pub async fn test_state(with_model: bool) -> Arc<AppState> {
    let records = SqliteRecordStore::in_memory()
        .await
        .expect("in-memory SQLite store");
    let predictor: Option<Arc<dyn Predictor>> = if with_model {
        Some(Arc::new(GlucoseCutoffPredictor))
    } else {
        None
    };

    Arc::new(AppState::new(
        AppConfig::default(),
        predictor,
        Arc::new(records),
        ResearchAssistant::new(Arc::new(EchoLlm)),
    ))
}

/// Router with a model loaded
pub async fn create_router_for_testing() -> Router {
    create_router(test_state(true).await)
}

/// Router whose model failed to load
pub async fn create_router_without_model() -> Router {
    create_router(test_state(false).await)
}
