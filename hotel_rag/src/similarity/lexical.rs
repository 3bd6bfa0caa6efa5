use async_trait::async_trait;
use std::sync::Arc;
use travel_config::{GraphSchema, IndexStrategy};
use travel_observability::log_timed;

use super::{canonical_text, format_scored, DerivedFields, SimilarityIndex};
use crate::errors::{RagError, RagResult};
use crate::graph_db::{is_already_exists, CypherQuery, Filter, GraphStore, Predicate, Prop, Value};
use crate::models::{Generation, HotelRecord, IndexDescriptor, SearchResult, LEXICAL_INDEX};

/// Domain keywords, matched as substrings in this order.
pub const VOCABULARY: [&str; 8] = [
    "paris", "london", "tokyo", "hotel", "luxury", "budget", "star", "clean",
];

/// Fallback tokens dropped even when long enough.
pub const STOP_WORDS: [&str; 6] = ["find", "show", "hotels", "hotel", "give", "want"];

/// Score attached to every substring match. Not a relevance signal.
pub const PLACEHOLDER_SCORE: f64 = 0.8;

const RESULT_COLUMNS: [&str; 3] = ["hotel", "stars", "rating"];

/// Search terms for a query: vocabulary hits in vocabulary order, otherwise
/// long non-stop-word tokens in query order. May be empty.
pub fn extract_terms(query: &str) -> Vec<String> {
    extract_terms_with(query, &VOCABULARY)
}

pub fn extract_terms_with(query: &str, vocabulary: &[&str]) -> Vec<String> {
    let lowered = query.to_lowercase();

    let hits: Vec<String> = vocabulary
        .iter()
        .filter(|keyword| lowered.contains(**keyword))
        .map(|keyword| keyword.to_string())
        .collect();
    if !hits.is_empty() {
        return hits;
    }

    lowered
        .replace([',', '.'], " ")
        .split_whitespace()
        .filter(|token| token.chars().count() > 3 && !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Substring-containment index over `search_text`.
pub struct LexicalIndex {
    store: Arc<dyn GraphStore>,
    schema: GraphSchema,
}

impl LexicalIndex {
    pub fn new(store: Arc<dyn GraphStore>, schema: GraphSchema) -> Self {
        Self { store, schema }
    }

    fn search_query(&self, terms: &[String], top_k: usize) -> RagResult<CypherQuery> {
        let search_text = Prop::new("h", LEXICAL_INDEX.property);
        let filter = Filter::Any(
            terms
                .iter()
                .map(|term| Predicate::Contains(search_text.clone(), Value::from(term.as_str())))
                .collect(),
        );
        let compiled = filter.compile("term_")?;

        let text = format!(
            "MATCH (h:{label}) {filter} \
             RETURN h.name AS hotel, h.star_rating AS stars, h.average_reviews_score AS rating \
             ORDER BY h.star_rating DESC, h.average_reviews_score DESC \
             LIMIT $k",
            label = self.schema.hotel_label,
            filter = compiled.where_clause(),
        );

        Ok(CypherQuery::new(text)
            .params_from(compiled.params)
            .param("k", top_k)
            .returning(&RESULT_COLUMNS))
    }
}

/// Stable sort by stars then rating, both descending; equal keys keep their
/// incoming order. Missing values sort first, as Neo4j's `ORDER BY ... DESC`
/// places nulls.
pub(crate) fn rank(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.stars_key()
            .total_cmp(&a.stars_key())
            .then_with(|| b.rating_key().total_cmp(&a.rating_key()))
    });
}

#[async_trait]
impl SimilarityIndex for LexicalIndex {
    fn strategy(&self) -> IndexStrategy {
        IndexStrategy::Lexical
    }

    fn descriptors(&self) -> Vec<&'static IndexDescriptor> {
        vec![&LEXICAL_INDEX]
    }

    async fn create_index(&self) -> RagResult<()> {
        let query = CypherQuery::new(format!(
            "CREATE INDEX {name} IF NOT EXISTS FOR (h:{label}) ON (h.{property})",
            name = LEXICAL_INDEX.name,
            label = self.schema.hotel_label,
            property = LEXICAL_INDEX.property,
        ));

        match self.store.run(query).await {
            Ok(()) => {
                tracing::info!(index = LEXICAL_INDEX.name, "Text index ready");
                Ok(())
            }
            Err(e) if is_already_exists(&e) => {
                tracing::debug!(index = LEXICAL_INDEX.name, "Text index already exists");
                Ok(())
            }
            Err(e) => Err(RagError::IndexCreation {
                index: LEXICAL_INDEX.name.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn derive_fields(&self, hotel: &HotelRecord) -> RagResult<DerivedFields> {
        Ok(DerivedFields {
            search_text: canonical_text::lexical_text(hotel),
            vectors: Vec::new(),
        })
    }

    async fn search_similar(
        &self,
        query: &str,
        top_k: usize,
        generation: Option<Generation>,
    ) -> RagResult<Vec<SearchResult>> {
        if let Some(requested) = generation.filter(|g| *g != Generation::Lexical) {
            return Err(RagError::GenerationMismatch {
                requested: requested.to_string(),
                available: Generation::Lexical.to_string(),
            });
        }

        let terms = extract_terms(query);
        if terms.is_empty() || top_k == 0 {
            tracing::debug!(query, "No search terms extracted; skipping text search");
            return Ok(Vec::new());
        }
        tracing::debug!(?terms, top_k, "Running text search");

        let cypher = self.search_query(&terms, top_k)?;
        let records = log_timed!("lexical_search", self.store.fetch(cypher).await)?;

        let mut results: Vec<SearchResult> = records
            .iter()
            .filter_map(SearchResult::from_record)
            .map(|r| r.with_score(PLACEHOLDER_SCORE))
            .collect();
        rank(&mut results);
        results.truncate(top_k);

        Ok(results)
    }

    fn format_results(&self, results: &[SearchResult]) -> String {
        format_scored(results, "Score")
    }
}
