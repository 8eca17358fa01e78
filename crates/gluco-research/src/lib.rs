//! Gluco Research - LLM-backed research assistant
//!
//! Answers general diabetes education questions. Independent of the
//! prediction pipeline.

pub mod assistant;
pub mod llm;

pub use assistant::{ResearchAssistant, EMPTY_QUESTION_REPLY, SYSTEM_PROMPT};
pub use llm::{create_llm_client, OllamaClient, OpenAiCompatibleClient};
