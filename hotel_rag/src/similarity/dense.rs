use async_trait::async_trait;
use std::sync::Arc;
use travel_config::{GraphSchema, IndexSettings, IndexStrategy};
use travel_observability::log_timed;

use super::{canonical_text, format_scored, DerivedFields, SimilarityIndex};
use crate::embedding::{EmbeddingModel, HuggingFaceEmbeddingModel};
use crate::errors::{RagError, RagResult};
use crate::graph_db::{is_already_exists, CypherQuery, GraphStore, Value};
use crate::models::{Generation, HotelRecord, IndexDescriptor, SearchResult};

const RESULT_COLUMNS: [&str; 4] = ["hotel", "stars", "rating", "score"];

/// An embedding model serving exactly one vector index.
struct Binding {
    descriptor: &'static IndexDescriptor,
    model: Arc<dyn EmbeddingModel>,
}

/// Approximate nearest-neighbour search over one or two vector indexes.
pub struct DenseIndex {
    store: Arc<dyn GraphStore>,
    schema: GraphSchema,
    bindings: Vec<Binding>,
}

impl DenseIndex {
    /// Bind already-loaded models to their generations.
    ///
    /// Each model must produce vectors of its index's dimension, and the
    /// 384-dim generation is always present.
    pub fn new(
        store: Arc<dyn GraphStore>,
        schema: GraphSchema,
        models: Vec<(Generation, Arc<dyn EmbeddingModel>)>,
    ) -> RagResult<Self> {
        let mut bindings: Vec<Binding> = Vec::with_capacity(models.len());

        for (generation, model) in models {
            let descriptor = generation.descriptor();
            let expected = descriptor.dimension.ok_or_else(|| RagError::ModelLoad {
                model: model.model_id().to_string(),
                reason: format!("{} is not a vector generation", generation),
            })?;
            if model.dimension() != expected {
                return Err(RagError::ModelLoad {
                    model: model.model_id().to_string(),
                    reason: format!(
                        "produces {}-dim vectors but {} expects {}",
                        model.dimension(),
                        descriptor.name,
                        expected
                    ),
                });
            }
            if bindings.iter().any(|b| b.descriptor.generation == generation) {
                return Err(RagError::ModelLoad {
                    model: model.model_id().to_string(),
                    reason: format!("{} is already bound", generation),
                });
            }
            bindings.push(Binding { descriptor, model });
        }

        if !bindings.iter().any(|b| b.descriptor.generation == Generation::DenseV1) {
            return Err(RagError::ModelLoad {
                model: "(none)".to_string(),
                reason: "a dense-v1 model is required".to_string(),
            });
        }

        Ok(Self {
            store,
            schema,
            bindings,
        })
    }

    /// Load the configured HuggingFace models. Any model failing to load
    /// aborts construction.
    pub async fn load(
        store: Arc<dyn GraphStore>,
        schema: GraphSchema,
        settings: &IndexSettings,
        hf_token: &str,
    ) -> RagResult<Self> {
        let mut models: Vec<(Generation, Arc<dyn EmbeddingModel>)> = Vec::new();

        let v1 = HuggingFaceEmbeddingModel::load(hf_token, &settings.model_v1, dimension_of(Generation::DenseV1), None).await?;
        models.push((Generation::DenseV1, Arc::new(v1)));

        if let Some(model_v2) = &settings.model_v2 {
            let v2 = HuggingFaceEmbeddingModel::load(hf_token, model_v2, dimension_of(Generation::DenseV2), None).await?;
            models.push((Generation::DenseV2, Arc::new(v2)));
        }

        Self::new(store, schema, models)
    }

    pub fn generations(&self) -> Vec<Generation> {
        self.bindings.iter().map(|b| b.descriptor.generation).collect()
    }

    fn binding(&self, generation: Generation) -> RagResult<&Binding> {
        self.bindings
            .iter()
            .find(|b| b.descriptor.generation == generation)
            .ok_or_else(|| RagError::GenerationMismatch {
                requested: generation.to_string(),
                available: self
                    .generations()
                    .iter()
                    .map(Generation::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    fn create_query(&self, descriptor: &IndexDescriptor, dimension: usize) -> CypherQuery {
        CypherQuery::new(format!(
            "CREATE VECTOR INDEX {name} IF NOT EXISTS FOR (h:{label}) ON (h.{property}) \
             OPTIONS {{indexConfig: {{`vector.dimensions`: {dimension}, `vector.similarity_function`: '{similarity}'}}}}",
            name = descriptor.name,
            label = self.schema.hotel_label,
            property = descriptor.property,
            dimension = dimension,
            similarity = descriptor.similarity.as_str(),
        ))
    }
}

fn dimension_of(generation: Generation) -> usize {
    generation.descriptor().dimension.unwrap_or_default()
}

#[async_trait]
impl SimilarityIndex for DenseIndex {
    fn strategy(&self) -> IndexStrategy {
        IndexStrategy::Dense
    }

    fn descriptors(&self) -> Vec<&'static IndexDescriptor> {
        self.bindings.iter().map(|b| b.descriptor).collect()
    }

    async fn create_index(&self) -> RagResult<()> {
        let mut failures = Vec::new();

        for binding in &self.bindings {
            let descriptor = binding.descriptor;
            let query = self.create_query(descriptor, binding.model.dimension());

            match self.store.run(query).await {
                Ok(()) => tracing::info!(index = descriptor.name, "Vector index ready"),
                Err(e) if is_already_exists(&e) => {
                    tracing::debug!(index = descriptor.name, "Vector index already exists")
                }
                Err(e) => {
                    tracing::warn!(index = descriptor.name, error = %e, "Vector index creation failed");
                    failures.push(format!("{}: {}", descriptor.name, e));
                }
            }
        }

        if failures.len() == self.bindings.len() {
            return Err(RagError::IndexCreation {
                index: self
                    .descriptors()
                    .iter()
                    .map(|d| d.name)
                    .collect::<Vec<_>>()
                    .join(", "),
                reason: failures.join("; "),
            });
        }

        Ok(())
    }

    async fn derive_fields(&self, hotel: &HotelRecord) -> RagResult<DerivedFields> {
        let sentence = canonical_text::dense_text(hotel);
        let mut vectors = Vec::with_capacity(self.bindings.len());

        for binding in &self.bindings {
            let vector = binding.model.embed(&sentence).await?;
            let expected = binding.model.dimension();
            if vector.len() != expected {
                return Err(RagError::DimensionMismatch {
                    index: binding.descriptor.name.to_string(),
                    expected,
                    actual: vector.len(),
                });
            }
            vectors.push((binding.descriptor.property, vector));
        }

        Ok(DerivedFields {
            search_text: canonical_text::lexical_text(hotel),
            vectors,
        })
    }

    async fn search_similar(
        &self,
        query: &str,
        top_k: usize,
        generation: Option<Generation>,
    ) -> RagResult<Vec<SearchResult>> {
        let binding = self.binding(generation.unwrap_or(Generation::DenseV1))?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let embedding = binding.model.embed(query).await?;
        let expected = binding.model.dimension();
        if embedding.len() != expected {
            return Err(RagError::DimensionMismatch {
                index: binding.descriptor.name.to_string(),
                expected,
                actual: embedding.len(),
            });
        }

        let cypher = CypherQuery::new(
            "CALL db.index.vector.queryNodes($index_name, $k, $embedding) \
             YIELD node AS h, score \
             RETURN h.name AS hotel, h.star_rating AS stars, h.average_reviews_score AS rating, score \
             ORDER BY score DESC",
        )
        .param("index_name", binding.descriptor.name)
        .param("k", top_k)
        .param("embedding", Value::from(embedding))
        .returning(&RESULT_COLUMNS);

        tracing::debug!(index = binding.descriptor.name, top_k, "Running vector search");
        let records = log_timed!("dense_search", self.store.fetch(cypher).await)?;

        Ok(records.iter().filter_map(SearchResult::from_record).collect())
    }

    fn format_results(&self, results: &[SearchResult]) -> String {
        format_scored(results, "Similarity")
    }
}
