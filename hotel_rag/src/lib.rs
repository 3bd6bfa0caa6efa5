//! Hybrid retrieval over a hotel knowledge graph.
//!
//! A query is answered from two paths: a structured traversal filtered by the
//! extracted entity slots ([`GraphRetriever`]) and, for search-like intents, a
//! similarity index over derived hotel text ([`SimilarityIndex`]). The
//! [`EmbeddingPipeline`] writes the derived fields before serving starts.

pub mod embedding;
pub mod errors;
pub mod graph_db;
pub mod inference;
pub mod models;
pub mod services;
pub mod similarity;

pub use errors::{RagError, RagResult};
pub use graph_db::{GraphStore, Neo4jClient};
pub use models::{EntitySlots, Generation, Intent, SearchResult};
pub use services::{
    EmbeddingPipeline, GraphRetriever, HybridEngine, PopulateReport, ResultFusion, RetrievalContext,
};
pub use similarity::{DenseIndex, LexicalIndex, SimilarityIndex};
