pub mod huggingface;

pub use huggingface::HuggingFaceEmbeddingModel;

use async_trait::async_trait;

use crate::errors::RagResult;

/// A text encoder producing fixed-length vectors.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    fn model_id(&self) -> &str;

    /// Length of every vector this model returns.
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> RagResult<Vec<f32>>;
}

/// Scale to unit length so that dot product equals cosine similarity.
pub fn normalize_vector(vec: Vec<f32>) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-12 {
        vec.into_iter().map(|x| x / norm).collect()
    } else {
        vec
    }
}
