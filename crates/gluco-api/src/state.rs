//! Application state management

use gluco_core::{AppConfig, Predictor, RecordRepository};
use gluco_research::ResearchAssistant;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::AppError;

/// Application state shared across handlers
///
/// Everything here is read-only after startup apart from the request counter.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Classifier; absent when no model file was found at startup
    pub predictor: Option<Arc<dyn Predictor>>,
    /// Prediction record store
    pub records: Arc<dyn RecordRepository>,
    /// Research chat assistant
    pub assistant: ResearchAssistant,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: AppConfig,
        predictor: Option<Arc<dyn Predictor>>,
        records: Arc<dyn RecordRepository>,
        assistant: ResearchAssistant,
    ) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            predictor,
            records,
            assistant,
        }
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::Relaxed)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// The loaded predictor, or `ModelUnavailable`
    pub fn predictor(&self) -> Result<&Arc<dyn Predictor>, AppError> {
        self.predictor.as_ref().ok_or(AppError::ModelUnavailable)
    }

    pub fn has_predictor(&self) -> bool {
        self.predictor.is_some()
    }
}
