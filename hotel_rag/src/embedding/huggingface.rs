use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use travel_observability::log_external_call;

use super::{normalize_vector, EmbeddingModel};
use crate::errors::{RagError, RagResult};

pub const DEFAULT_INFERENCE_BASE: &str = "https://router.huggingface.co/hf-inference/models";

static KNOWN_DIMENSIONS: phf::Map<&'static str, usize> = phf::phf_map! {
    "sentence-transformers/all-MiniLM-L6-v2" => 384,
    "sentence-transformers/all-MiniLM-L12-v2" => 384,
    "sentence-transformers/paraphrase-MiniLM-L6-v2" => 384,
    "sentence-transformers/all-mpnet-base-v2" => 768,
    "sentence-transformers/multi-qa-mpnet-base-dot-v1" => 768,
    "BAAI/bge-small-en-v1.5" => 384,
    "BAAI/bge-base-en-v1.5" => 768,
    "intfloat/e5-small-v2" => 384,
    "intfloat/e5-base-v2" => 768,
};

/// Dimension of a well-known sentence-embedding model, if listed.
pub fn known_dimension(model_id: &str) -> Option<usize> {
    KNOWN_DIMENSIONS.get(model_id).copied()
}

/// Request body for the HuggingFace feature-extraction pipeline
#[derive(Debug, Clone, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a str,
    options: FeatureExtractionOptions,
}

#[derive(Debug, Clone, Serialize)]
struct FeatureExtractionOptions {
    wait_for_model: bool,
    use_cache: bool,
}

/// Inference endpoints return either a bare vector, a batch of vectors, or an error object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    Single(Vec<f32>),
    Batch(Vec<Vec<f32>>),
    Error { error: String },
}

/// Sentence-embedding model served by the HuggingFace inference API.
pub struct HuggingFaceEmbeddingModel {
    client: Client,
    api_token: String,
    url: String,
    model_id: String,
    dimension: usize,
}

impl HuggingFaceEmbeddingModel {
    /// Load a model and verify it produces `dimension`-length vectors.
    ///
    /// The model is probed once; any failure (bad token, unknown model, wrong
    /// dimension) is a `ModelLoad` error so no work starts with a model that
    /// cannot serve its index.
    pub async fn load(
        api_token: &str,
        model_id: &str,
        dimension: usize,
        base_url: Option<&str>,
    ) -> RagResult<Self> {
        let load_error = |reason: String| RagError::ModelLoad {
            model: model_id.to_string(),
            reason,
        };

        if api_token.trim().is_empty() {
            return Err(load_error("HF_TOKEN is empty".to_string()));
        }

        if let Some(known) = known_dimension(model_id) {
            if known != dimension {
                return Err(load_error(format!(
                    "model produces {}-dim vectors, index expects {}",
                    known, dimension
                )));
            }
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| load_error(format!("failed to create HTTP client: {}", e)))?;

        let base = base_url.unwrap_or(DEFAULT_INFERENCE_BASE).trim_end_matches('/');
        let model = Self {
            client,
            api_token: api_token.to_string(),
            url: format!("{}/{}/pipeline/feature-extraction", base, model_id),
            model_id: model_id.to_string(),
            dimension,
        };

        let probe = model
            .request("hotel")
            .await
            .map_err(|e| load_error(e.to_string()))?;
        if probe.len() != dimension {
            return Err(load_error(format!(
                "probe returned {} values, expected {}",
                probe.len(),
                dimension
            )));
        }

        tracing::info!(model = %model_id, dimension, "Embedding model loaded");
        Ok(model)
    }

    async fn request(&self, text: &str) -> RagResult<Vec<f32>> {
        let body = FeatureExtractionRequest {
            inputs: text,
            options: FeatureExtractionOptions {
                wait_for_model: true,
                use_cache: true,
            },
        };

        let start = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("request to {} failed: {}", self.model_id, e)))?;

        let status = response.status();
        log_external_call!(
            "huggingface",
            self.model_id.as_str(),
            start.elapsed().as_millis() as u64,
            status.as_u16()
        );

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "HuggingFace API error ({}): {}",
                status, error_text
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| RagError::Embedding(e.to_string()))?;
        parse_response(&text)
    }
}

fn parse_response(body: &str) -> RagResult<Vec<f32>> {
    match serde_json::from_str::<FeatureExtractionResponse>(body) {
        Ok(FeatureExtractionResponse::Single(v)) => Ok(v),
        Ok(FeatureExtractionResponse::Batch(batch)) => batch
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("empty embedding batch".to_string())),
        Ok(FeatureExtractionResponse::Error { error }) => {
            Err(RagError::Embedding(format!("HuggingFace API error: {}", error)))
        }
        Err(e) => Err(RagError::Embedding(format!(
            "failed to parse embedding response: {}. Response: {}",
            e,
            body.chars().take(200).collect::<String>()
        ))),
    }
}

#[async_trait]
impl EmbeddingModel for HuggingFaceEmbeddingModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        let raw = self.request(text).await?;
        if raw.len() != self.dimension {
            return Err(RagError::Embedding(format!(
                "{} returned {} values, expected {}",
                self.model_id,
                raw.len(),
                self.dimension
            )));
        }
        Ok(normalize_vector(raw))
    }
}
