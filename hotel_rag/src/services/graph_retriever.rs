use std::sync::Arc;
use tracing::{debug, info, warn};
use travel_config::GraphSchema;
use travel_observability::log_timed;

use crate::errors::RagResult;
use crate::graph_db::{CypherQuery, Filter, GraphStore, Predicate, Prop, Value};
use crate::models::{EntitySlots, Intent, SearchResult, SlotValue};

/// Exact output of `format_results` for an empty result list.
pub const NO_RESULTS: &str = "No results found";

const RESULT_COLUMNS: [&str; 5] = ["hotel", "stars", "rating", "city", "country"];

/// Structured ("baseline") retrieval: one parameterized traversal per request,
/// filtered by the populated entity slots.
pub struct GraphRetriever {
    store: Arc<dyn GraphStore>,
    schema: GraphSchema,
    limit: usize,
}

impl GraphRetriever {
    pub fn new(store: Arc<dyn GraphStore>, schema: GraphSchema, limit: usize) -> Self {
        Self { store, schema, limit }
    }

    pub async fn retrieve_baseline(
        &self,
        intent: Intent,
        slots: &EntitySlots,
    ) -> RagResult<Vec<SearchResult>> {
        let query = self.build_query(intent, slots)?;
        debug!(%intent, slots = %slots.summary(), "Running baseline query");

        let records = log_timed!("baseline_query", self.store.fetch(query).await)?;
        let results: Vec<SearchResult> = records.iter().filter_map(SearchResult::from_record).collect();

        info!(%intent, count = results.len(), "Baseline retrieval complete");
        Ok(results)
    }

    /// The traversal for `(intent, slots)`. Slot values only ever appear as
    /// bound parameters.
    pub fn build_query(&self, intent: Intent, slots: &EntitySlots) -> RagResult<CypherQuery> {
        let compiled = Filter::All(slot_predicates(slots)).compile("p")?;

        let order_by = match intent {
            Intent::Recommendation => "ORDER BY h.average_reviews_score DESC ",
            _ => "",
        };

        let text = format!(
            "MATCH (h:{label})-[:LOCATED_IN]->(c:City)-[:LOCATED_IN]->(co:Country) {filter}{sep}\
             RETURN h.name AS hotel, h.star_rating AS stars, h.average_reviews_score AS rating, \
             c.name AS city, co.name AS country \
             {order_by}LIMIT $limit",
            label = self.schema.hotel_label,
            filter = compiled.where_clause(),
            sep = if compiled.clause.is_some() { " " } else { "" },
            order_by = order_by,
        );

        Ok(CypherQuery::new(text)
            .params_from(compiled.params)
            .param("limit", self.limit)
            .returning(&RESULT_COLUMNS))
    }

    pub fn format_results(&self, results: &[SearchResult]) -> String {
        format_results(results)
    }

    /// Release the store connection. Repeat calls are no-ops.
    pub async fn close(&self) -> RagResult<()> {
        self.store.close().await
    }
}

/// `1. Grand Paris (5 stars, rating 9.1) - Paris, France`, one line per result.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut line = format!("{}. {}", i + 1, r.name);
            let mut details = Vec::new();
            if let Some(stars) = r.stars {
                details.push(format!("{} stars", stars));
            }
            if let Some(rating) = r.rating {
                details.push(format!("rating {}", rating));
            }
            if !details.is_empty() {
                line.push_str(&format!(" ({})", details.join(", ")));
            }
            if let (Some(city), Some(country)) = (&r.city, &r.country) {
                line.push_str(&format!(" - {}, {}", city, country));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One predicate per populated, recognised slot, in slot-name order.
pub fn slot_predicates(slots: &EntitySlots) -> Vec<Predicate> {
    let mut predicates = Vec::new();

    for (name, value) in slots.populated() {
        let predicate = match name {
            "city" => text_eq(Prop::new("c", "name"), value),
            "country" => text_eq(Prop::new("co", "name"), value),
            "hotel_name" | "hotel" => text_eq(Prop::new("h", "name"), value),
            "star_rating" | "stars" => value.as_i64().map(|v| Predicate::Eq(stars(), Value::Int(v))),
            "min_stars" => value.as_i64().map(|v| Predicate::Gte(stars(), Value::Int(v))),
            "max_stars" => value.as_i64().map(|v| Predicate::Lte(stars(), Value::Int(v))),
            "min_rating" => value
                .as_f64()
                .map(|v| Predicate::Gte(Prop::new("h", "average_reviews_score"), Value::Float(v))),
            "budget" => budget_predicate(value),
            _ => {
                debug!(slot = name, "Ignoring unrecognised slot");
                continue;
            }
        };

        match predicate {
            Some(p) => predicates.push(p),
            None => warn!(slot = name, value = %value, "Slot value has the wrong type; skipped"),
        }
    }

    predicates
}

fn stars() -> Prop {
    Prop::new("h", "star_rating")
}

fn text_eq(prop: Prop, value: &SlotValue) -> Option<Predicate> {
    value.as_text().map(|v| Predicate::Eq(prop, Value::from(v)))
}

/// Budget tiers map onto star ranges; a bare number is a star ceiling.
fn budget_predicate(value: &SlotValue) -> Option<Predicate> {
    if let Some(ceiling) = value.as_i64() {
        return Some(Predicate::Lte(stars(), Value::Int(ceiling)));
    }

    let tier = value.as_text()?.to_lowercase();
    match tier.as_str() {
        "budget" | "cheap" | "low" => Some(Predicate::Lte(stars(), Value::Int(3))),
        "mid" | "moderate" | "medium" => Some(Predicate::Eq(stars(), Value::Int(3))),
        "luxury" | "high" | "premium" => Some(Predicate::Gte(stars(), Value::Int(4))),
        _ => None,
    }
}
