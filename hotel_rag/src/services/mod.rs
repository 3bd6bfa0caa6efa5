pub mod embedding_pipeline;
pub mod engine;
pub mod fusion_service;
pub mod graph_retriever;

pub use embedding_pipeline::{EmbeddingPipeline, PopulateReport};
pub use engine::{HybridEngine, RetrievalContext};
pub use fusion_service::ResultFusion;
pub use graph_retriever::GraphRetriever;
