pub mod canonical_text;
pub mod dense;
pub mod lexical;

pub use dense::DenseIndex;
pub use lexical::LexicalIndex;

use async_trait::async_trait;
use std::sync::Arc;
use travel_config::{AppConfig, IndexStrategy};
use travel_observability::log_feature;

use crate::errors::RagResult;
use crate::graph_db::GraphStore;
use crate::models::{Generation, HotelRecord, IndexDescriptor, SearchResult};

/// Exact output of `format_results` for an empty result list.
pub const NO_SEMANTIC_MATCHES: &str = "No semantic matches found.";

/// Field values derived from one hotel, written back in a single update.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFields {
    pub search_text: String,
    /// `(property, vector)` per dense generation served by the index.
    pub vectors: Vec<(&'static str, Vec<f32>)>,
}

/// Similarity search over derived hotel fields.
///
/// Implementations own the lifecycle of their store indexes and decide which
/// fields the embedding pipeline writes.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    fn strategy(&self) -> IndexStrategy;

    /// Indexes this variant maintains, in creation order.
    fn descriptors(&self) -> Vec<&'static IndexDescriptor>;

    /// Create the backing indexes. Safe to repeat.
    async fn create_index(&self) -> RagResult<()>;

    async fn derive_fields(&self, hotel: &HotelRecord) -> RagResult<DerivedFields>;

    /// `generation` selects the index for variants serving more than one;
    /// `None` means the variant's primary index.
    async fn search_similar(
        &self,
        query: &str,
        top_k: usize,
        generation: Option<Generation>,
    ) -> RagResult<Vec<SearchResult>>;

    fn format_results(&self, results: &[SearchResult]) -> String;
}

/// Build the index variant selected by configuration.
///
/// The dense variant loads its models here, so a model that cannot be loaded
/// fails before anything is written to the store.
pub async fn from_config(
    config: &AppConfig,
    store: Arc<dyn GraphStore>,
) -> RagResult<Arc<dyn SimilarityIndex>> {
    log_feature!("DenseIndex", config.index.strategy == IndexStrategy::Dense);
    log_feature!("DenseV2", config.index.model_v2.is_some());

    match config.index.strategy {
        IndexStrategy::Lexical => Ok(Arc::new(LexicalIndex::new(store, config.schema.clone()))),
        IndexStrategy::Dense => {
            let token = config.require_hf_token()?;
            let index = DenseIndex::load(store, config.schema.clone(), &config.index, token).await?;
            Ok(Arc::new(index))
        }
    }
}

pub(crate) fn format_scored(results: &[SearchResult], label: &str) -> String {
    if results.is_empty() {
        return NO_SEMANTIC_MATCHES.to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {} ({}: {:.4})", i + 1, r.name, label, r.score.unwrap_or(0.0)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::errors::{RagError, RagResult};
    use crate::graph_db::{CypherQuery, GraphStore, Record};

    type Responder = Box<dyn Fn(&CypherQuery) -> RagResult<Vec<Record>> + Send + Sync>;

    /// Store double that records every query and answers from a closure.
    pub struct ScriptedStore {
        pub queries: Mutex<Vec<CypherQuery>>,
        responder: Responder,
    }

    impl ScriptedStore {
        pub fn new<F>(responder: F) -> Self
        where
            F: Fn(&CypherQuery) -> RagResult<Vec<Record>> + Send + Sync + 'static,
        {
            Self {
                queries: Mutex::new(Vec::new()),
                responder: Box::new(responder),
            }
        }

        pub fn empty() -> Self {
            Self::new(|_| Ok(Vec::new()))
        }

        pub fn failing_when(needle: &'static str, message: &'static str) -> Self {
            Self::new(move |q| {
                if q.text().contains(needle) {
                    Err(RagError::Neo4j(message.to_string()))
                } else {
                    Ok(Vec::new())
                }
            })
        }

        pub fn query_count(&self) -> usize {
            self.queries.lock().len()
        }
    }

    #[async_trait]
    impl GraphStore for ScriptedStore {
        async fn run(&self, query: CypherQuery) -> RagResult<()> {
            let result = (self.responder)(&query).map(|_| ());
            self.queries.lock().push(query);
            result
        }

        async fn fetch(&self, query: CypherQuery) -> RagResult<Vec<Record>> {
            let result = (self.responder)(&query);
            self.queries.lock().push(query);
            result
        }

        async fn close(&self) -> RagResult<()> {
            Ok(())
        }
    }
}
