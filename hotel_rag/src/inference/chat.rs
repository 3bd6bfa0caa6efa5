use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use travel_observability::log_external_call;

use super::{strip_thinking, InferenceClient};
use crate::errors::{RagError, RagResult};

pub const DEFAULT_ROUTER_BASE: &str = "https://router.huggingface.co/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Chat completions through the HuggingFace inference router.
pub struct HuggingFaceChatClient {
    client: reqwest::Client,
    api_token: String,
    base_url: String,
    max_tokens: u32,
}

impl HuggingFaceChatClient {
    pub fn new(api_token: &str, base_url: Option<String>) -> RagResult<Self> {
        if api_token.trim().is_empty() {
            return Err(RagError::Inference("HF_TOKEN is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| RagError::Inference(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_token: api_token.to_string(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_ROUTER_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            max_tokens: 512,
        })
    }
}

#[async_trait]
impl InferenceClient for HuggingFaceChatClient {
    async fn complete(&self, model: &str, prompt: &str) -> RagResult<String> {
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            max_tokens: Some(self.max_tokens),
        };

        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Inference(format!("request to {} failed: {}", model, e)))?;

        let status = response.status();
        log_external_call!(
            "huggingface",
            "chat/completions",
            start.elapsed().as_millis() as u64,
            status.as_u16()
        );

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RagError::Inference(format!(
                "HuggingFace API error ({}): {}",
                status, error_text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| RagError::Inference(format!("invalid chat response: {}", e)))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RagError::Inference(format!("no response from {}", model)))?;

        Ok(strip_thinking(&text))
    }
}
