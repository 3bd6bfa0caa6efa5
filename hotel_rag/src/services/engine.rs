use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use travel_config::AppConfig;

use super::embedding_pipeline::{EmbeddingPipeline, PopulateReport};
use super::fusion_service::ResultFusion;
use super::graph_retriever::GraphRetriever;
use crate::errors::RagResult;
use crate::graph_db::{GraphStore, Neo4jClient};
use crate::models::{EntitySlots, Generation, Intent, SearchResult};
use crate::similarity::{self, SimilarityIndex};

/// Results of one retrieval cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalContext {
    pub intent: Intent,
    pub baseline: Vec<SearchResult>,
    /// Empty when the intent does not use semantic search.
    pub semantic: Vec<SearchResult>,
    pub combined: Vec<SearchResult>,
}

/// The hybrid retrieval engine: baseline traversal, similarity search and
/// the populate job over one store connection.
pub struct HybridEngine {
    store: Arc<dyn GraphStore>,
    retriever: GraphRetriever,
    index: Arc<dyn SimilarityIndex>,
    pipeline: EmbeddingPipeline,
    top_k: usize,
}

impl HybridEngine {
    /// Connect to Neo4j with the configured settings and initialize.
    pub async fn connect(config: &AppConfig) -> RagResult<Self> {
        let store: Arc<dyn GraphStore> = Arc::new(Neo4jClient::connect(&config.neo4j).await?);
        Self::initialize(config, store).await
    }

    /// Build the configured similarity index (loading its models) and make
    /// sure its store indexes exist.
    pub async fn initialize(config: &AppConfig, store: Arc<dyn GraphStore>) -> RagResult<Self> {
        let index = similarity::from_config(config, store.clone()).await?;
        let engine = Self::with_index(config, store, index);
        engine.index.create_index().await?;

        info!(
            strategy = engine.index.strategy().as_str(),
            indexes = ?engine.index.descriptors().iter().map(|d| d.name).collect::<Vec<_>>(),
            "Hybrid retrieval engine initialized"
        );
        Ok(engine)
    }

    /// Assemble an engine around an existing index without touching the store.
    pub fn with_index(
        config: &AppConfig,
        store: Arc<dyn GraphStore>,
        index: Arc<dyn SimilarityIndex>,
    ) -> Self {
        Self {
            retriever: GraphRetriever::new(store.clone(), config.schema.clone(), config.baseline_limit),
            pipeline: EmbeddingPipeline::new(
                store.clone(),
                index.clone(),
                config.schema.clone(),
                config.progress_every,
            ),
            store,
            index,
            top_k: config.semantic_top_k,
        }
    }

    pub fn index(&self) -> &dyn SimilarityIndex {
        self.index.as_ref()
    }

    pub async fn retrieve_baseline(
        &self,
        intent: Intent,
        slots: &EntitySlots,
    ) -> RagResult<Vec<SearchResult>> {
        self.retriever.retrieve_baseline(intent, slots).await
    }

    pub async fn search_similar(
        &self,
        query: &str,
        top_k: usize,
        generation: Option<Generation>,
    ) -> RagResult<Vec<SearchResult>> {
        self.index.search_similar(query, top_k, generation).await
    }

    pub async fn populate(&self, force_all: bool) -> RagResult<PopulateReport> {
        self.pipeline.populate(force_all).await
    }

    /// Baseline always; semantic search only for intents that use it. The
    /// two store queries run one after the other.
    pub async fn retrieve_context(
        &self,
        query: &str,
        intent: Intent,
        slots: &EntitySlots,
    ) -> RagResult<RetrievalContext> {
        let baseline = self.retrieve_baseline(intent, slots).await?;

        let semantic = if intent.uses_semantic_search() {
            self.search_similar(query, self.top_k, None).await?
        } else {
            Vec::new()
        };

        let combined = ResultFusion::combine(intent, baseline.clone(), semantic.clone());
        Ok(RetrievalContext {
            intent,
            baseline,
            semantic,
            combined,
        })
    }

    /// Both result sections, as shown to the user.
    pub fn format_context(&self, context: &RetrievalContext) -> String {
        format!(
            "--- Baseline Results (Cypher) ---\n{}\n\n--- Semantic Search Results ({}) ---\n{}",
            self.retriever.format_results(&context.baseline),
            self.index.strategy().as_str(),
            self.index.format_results(&context.semantic),
        )
    }

    /// Release the store connection. Safe to call more than once.
    pub async fn close(&self) -> RagResult<()> {
        self.store.close().await
    }
}
