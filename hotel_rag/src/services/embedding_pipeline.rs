use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use travel_config::GraphSchema;
use travel_observability::log_db;

use crate::errors::{RagError, RagResult};
use crate::graph_db::{CypherQuery, Filter, GraphStore, Predicate, Prop, Value};
use crate::models::{HotelRecord, HOTEL_COLUMNS, LEXICAL_INDEX};
use crate::similarity::{DerivedFields, SimilarityIndex};

/// Outcome of one populate run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopulateReport {
    /// Rows returned by the fetch query.
    pub total: usize,
    pub updated: usize,
    /// Rows without an identifier; they cannot be written back.
    pub skipped: usize,
    /// Identifiers of entities whose fields could not be derived or written.
    pub failed: Vec<String>,
}

impl PopulateReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped == 0
    }
}

/// Batch job deriving `search_text` and vector fields for every hotel.
///
/// Each hotel is written with one `SET` statement, so an interrupted run
/// leaves at most the in-flight hotel stale. Re-running recomputes every
/// field from source data.
pub struct EmbeddingPipeline {
    store: Arc<dyn GraphStore>,
    index: Arc<dyn SimilarityIndex>,
    schema: GraphSchema,
    progress_every: usize,
}

impl EmbeddingPipeline {
    pub fn new(
        store: Arc<dyn GraphStore>,
        index: Arc<dyn SimilarityIndex>,
        schema: GraphSchema,
        progress_every: usize,
    ) -> Self {
        Self {
            store,
            index,
            schema,
            progress_every: progress_every.max(1),
        }
    }

    /// Derive and write fields. With `force_all = false` only hotels that
    /// have never been populated are fetched.
    pub async fn populate(&self, force_all: bool) -> RagResult<PopulateReport> {
        let start = Instant::now();
        let records = self.store.fetch(self.fetch_query(force_all)?).await?;

        let mut report = PopulateReport {
            total: records.len(),
            ..Default::default()
        };
        info!(
            total = report.total,
            strategy = self.index.strategy().as_str(),
            force_all,
            "Populating derived fields"
        );

        for (n, record) in records.iter().enumerate() {
            match HotelRecord::from_record(record) {
                Ok(hotel) => match self.update(&hotel).await {
                    Ok(()) => report.updated += 1,
                    Err(e) => {
                        error!(id = %hotel.id, error = %e, "Failed to update hotel");
                        report.failed.push(hotel.id.to_string());
                    }
                },
                Err((id, _)) if id.is_null() => {
                    warn!("Skipping hotel without identifier");
                    report.skipped += 1;
                }
                Err((id, field)) => {
                    let e = RagError::MissingField {
                        id: id.to_string(),
                        field,
                    };
                    error!(error = %e, "Failed to derive fields");
                    report.failed.push(id.to_string());
                }
            }

            if (n + 1) % self.progress_every == 0 {
                info!(processed = n + 1, total = report.total, "Populate progress");
            }
        }

        info!(
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Populate complete"
        );
        if !report.failed.is_empty() {
            warn!(ids = ?report.failed, "Some hotels were not updated");
        }

        Ok(report)
    }

    async fn update(&self, hotel: &HotelRecord) -> RagResult<()> {
        let fields = self.index.derive_fields(hotel).await?;
        log_db!("SET", self.schema.hotel_label.as_str(), hotel.id);
        self.store.run(self.update_query(&hotel.id, fields)).await
    }

    /// Every property the active index writes: `search_text` plus one per
    /// vector index. A hotel missing any of them is due for an update.
    fn written_properties(&self) -> Vec<&'static str> {
        let mut properties = vec![LEXICAL_INDEX.property];
        for descriptor in self.index.descriptors() {
            if !properties.contains(&descriptor.property) {
                properties.push(descriptor.property);
            }
        }
        properties
    }

    pub(crate) fn fetch_query(&self, force_all: bool) -> RagResult<CypherQuery> {
        let filter = if force_all {
            Filter::All(vec![])
        } else {
            Filter::Any(
                self.written_properties()
                    .into_iter()
                    .map(|property| Predicate::IsNull(Prop::new("h", property)))
                    .collect(),
            )
        };
        let compiled = filter.compile("p")?;

        let text = format!(
            "MATCH (h:{label})-[:LOCATED_IN]->(c:City)-[:LOCATED_IN]->(co:Country) {filter}{sep}\
             RETURN h.{id} AS id, h.name AS name, h.star_rating AS stars, \
             h.cleanliness_base AS clean, h.comfort_base AS comfort, \
             h.facilities_base AS facilities, c.name AS city, co.name AS country",
            label = self.schema.hotel_label,
            filter = compiled.where_clause(),
            sep = if compiled.clause.is_some() { " " } else { "" },
            id = self.schema.id_property,
        );

        Ok(CypherQuery::new(text)
            .params_from(compiled.params)
            .returning(&HOTEL_COLUMNS))
    }

    pub(crate) fn update_query(&self, id: &Value, fields: DerivedFields) -> CypherQuery {
        let mut assignments = vec![format!("h.{0} = ${0}", LEXICAL_INDEX.property)];
        for (property, _) in &fields.vectors {
            assignments.push(format!("h.{0} = ${0}", property));
        }

        let text = format!(
            "MATCH (h:{label} {{{id_prop}: $id}}) SET {assignments}",
            label = self.schema.hotel_label,
            id_prop = self.schema.id_property,
            assignments = assignments.join(", "),
        );
        debug!(query = %text, "Built update query");

        let mut query = CypherQuery::new(text)
            .param("id", id.clone())
            .param(LEXICAL_INDEX.property, fields.search_text);
        for (property, vector) in fields.vectors {
            query = query.param(property, vector);
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::test_support::ScriptedStore;
    use crate::similarity::LexicalIndex;

    fn pipeline(store: Arc<ScriptedStore>) -> EmbeddingPipeline {
        let index = Arc::new(LexicalIndex::new(store.clone(), GraphSchema::default()));
        EmbeddingPipeline::new(store, index, GraphSchema::default(), 100)
    }

    #[test]
    fn test_fetch_query_shape() {
        let pipeline = pipeline(Arc::new(ScriptedStore::empty()));

        let all = pipeline.fetch_query(true).unwrap();
        assert!(all.text().starts_with(
            "MATCH (h:Hotel)-[:LOCATED_IN]->(c:City)-[:LOCATED_IN]->(co:Country) RETURN h.hotel_id AS id"
        ));
        assert_eq!(all.columns().len(), 8);

        let missing = pipeline.fetch_query(false).unwrap();
        assert!(missing.text().contains("WHERE h.search_text IS NULL RETURN"));
    }

    #[test]
    fn test_missing_only_checks_every_written_property() {
        let store = Arc::new(ScriptedStore::empty());
        let index = Arc::new(
            crate::similarity::DenseIndex::new(
                store.clone(),
                GraphSchema::default(),
                vec![
                    (crate::models::Generation::DenseV1, fixed_model(384)),
                    (crate::models::Generation::DenseV2, fixed_model(768)),
                ],
            )
            .unwrap(),
        );
        let pipeline = EmbeddingPipeline::new(store, index, GraphSchema::default(), 100);

        let missing = pipeline.fetch_query(false).unwrap();
        assert!(missing.text().contains(
            "WHERE h.search_text IS NULL OR h.embedding IS NULL OR h.embedding_v2 IS NULL RETURN"
        ));
    }

    struct FixedModel(usize);

    #[async_trait::async_trait]
    impl crate::embedding::EmbeddingModel for FixedModel {
        fn model_id(&self) -> &str {
            "fixed"
        }

        fn dimension(&self) -> usize {
            self.0
        }

        async fn embed(&self, _text: &str) -> RagResult<Vec<f32>> {
            Ok(vec![0.5; self.0])
        }
    }

    fn fixed_model(dimension: usize) -> Arc<dyn crate::embedding::EmbeddingModel> {
        Arc::new(FixedModel(dimension))
    }

    #[test]
    fn test_update_is_a_single_statement() {
        let pipeline = pipeline(Arc::new(ScriptedStore::empty()));
        let fields = DerivedFields {
            search_text: "grand paris".to_string(),
            vectors: vec![("embedding", vec![0.5; 384]), ("embedding_v2", vec![0.5; 768])],
        };

        let query = pipeline.update_query(&Value::Int(7), fields);
        assert_eq!(
            query.text(),
            "MATCH (h:Hotel {hotel_id: $id}) SET h.search_text = $search_text, \
             h.embedding = $embedding, h.embedding_v2 = $embedding_v2"
        );
        assert_eq!(query.param_value("id"), Some(&Value::Int(7)));
        assert_eq!(query.param_value("embedding_v2").and_then(Value::as_float_list).map(|v| v.len()), Some(768));
    }

    #[tokio::test]
    async fn test_per_entity_failures_do_not_abort_the_batch() {
        let store = Arc::new(ScriptedStore::new(|q| {
            if q.text().contains("SET") {
                if q.param_value("id") == Some(&Value::Int(2)) {
                    return Err(RagError::Neo4j("constraint violation".to_string()));
                }
                return Ok(Vec::new());
            }
            let row = |id: Value, comfort: Value| {
                crate::graph_db::Record::new()
                    .with("id", id)
                    .with("name", "Grand Paris")
                    .with("stars", 5i64)
                    .with("clean", 9i64)
                    .with("comfort", comfort)
                    .with("facilities", 9i64)
                    .with("city", "Paris")
                    .with("country", "France")
            };
            Ok(vec![
                row(Value::Int(1), Value::Int(8)),
                row(Value::Int(2), Value::Int(8)),
                row(Value::Int(3), Value::Null),
                row(Value::Null, Value::Int(8)),
                row(Value::Int(5), Value::Float(7.5)),
            ])
        }));

        let report = pipeline(store.clone()).populate(true).await.unwrap();
        assert_eq!(report.total, 5);
        assert_eq!(report.updated, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, vec!["2".to_string(), "3".to_string()]);
        assert!(!report.is_complete());

        // fetch + three attempted updates
        assert_eq!(store.query_count(), 4);
    }
}
