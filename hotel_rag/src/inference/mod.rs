//! Collaborators around the retrieval core: intent extraction and the
//! generative model call.

pub mod chat;
pub mod intent;
pub mod prompt;

pub use chat::HuggingFaceChatClient;
pub use intent::LlmIntentExtractor;
pub use prompt::{format_prompt, strip_thinking};

use async_trait::async_trait;

use crate::errors::RagResult;
use crate::models::{EntitySlots, Intent};

/// Classifies a query and extracts its entity slots.
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    async fn extract(&self, query: &str) -> RagResult<(Intent, EntitySlots)>;
}

/// Text completion against a named model.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> RagResult<String>;
}
