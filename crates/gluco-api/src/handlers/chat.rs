//! Research chat handler

use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Chat request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// Question about diabetes research
    #[serde(default)]
    #[schema(example = "What are the early signs of type 2 diabetes?")]
    pub question: String,
}

/// Chat response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub answer: String,
}

/// Ask the research assistant
///
/// Always answers 200; LLM failures are reported in the answer text.
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant answer", body = ChatResponse)
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    state.increment_requests();

    let answer = state.assistant.answer(&request.question).await;
    Json(ChatResponse { answer })
}
