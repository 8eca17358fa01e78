//! Diabetes research assistant
//!
//! Wraps an LLM with a fixed educational system prompt. Failures never
//! surface as errors to the caller; they become the answer text.

use std::sync::Arc;

use gluco_core::{ChatMessage, LlmClient};

/// System prompt sent ahead of every question
pub const SYSTEM_PROMPT: &str = "You are a healthcare research assistant focused on diabetes. \
Provide concise, evidence-informed answers for general education. \
Avoid medical diagnosis or personalized treatment. \
If asked for medical advice, recommend consulting a licensed clinician. \
If uncertain, say you don't know.";

/// Reply to an empty question
pub const EMPTY_QUESTION_REPLY: &str = "please ask question about diabetes research";

/// Answers general diabetes research questions
#[derive(Clone, Default)]
pub struct ResearchAssistant {
    client: Option<Arc<dyn LlmClient>>,
}

impl ResearchAssistant {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Assistant with no LLM behind it; every question gets an error answer
    pub fn unconfigured() -> Self {
        Self { client: None }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Answer a question
    pub async fn answer(&self, question: &str) -> String {
        let question = question.trim();
        if question.is_empty() {
            return EMPTY_QUESTION_REPLY.to_string();
        }

        let Some(client) = &self.client else {
            return "Chat error: no LLM provider is configured".to_string();
        };

        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(question)];
        match client.chat(&messages).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(client = client.name(), error = %e, "Chat request failed");
                format!("Chat error: {e}")
            }
        }
    }
}

impl std::fmt::Debug for ResearchAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchAssistant")
            .field("client", &self.client.as_ref().map(|c| c.name()))
            .finish()
    }
}
