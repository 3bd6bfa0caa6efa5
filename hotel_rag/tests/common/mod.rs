#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};

use hotel_rag::embedding::{normalize_vector, EmbeddingModel};
use hotel_rag::graph_db::{CypherQuery, GraphStore, Record, Value};
use hotel_rag::RagResult;

/// A hotel node with its location and derived fields.
#[derive(Debug, Clone)]
pub struct StoredHotel {
    pub id: i64,
    pub name: String,
    pub stars: i64,
    pub clean: f64,
    pub comfort: i64,
    pub facilities: i64,
    pub rating: f64,
    pub city: String,
    pub country: String,
    pub fields: HashMap<String, Value>,
}

impl StoredHotel {
    pub fn new(id: i64, name: &str, stars: i64, rating: f64, city: &str, country: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            stars,
            clean: 9.0,
            comfort: 8,
            facilities: 9,
            rating,
            city: city.to_string(),
            country: country.to_string(),
            fields: HashMap::new(),
        }
    }

    fn result_row(&self) -> Record {
        Record::new()
            .with("hotel", self.name.as_str())
            .with("stars", self.stars)
            .with("rating", self.rating)
            .with("city", self.city.as_str())
            .with("country", self.country.as_str())
    }
}

/// In-memory graph store that understands the engine's query shapes.
#[derive(Default)]
pub struct MemoryStore {
    pub hotels: Mutex<Vec<StoredHotel>>,
    pub indexes: Mutex<BTreeSet<String>>,
    pub log: Mutex<Vec<CypherQuery>>,
    pub closed: Mutex<usize>,
}

impl MemoryStore {
    pub fn with_hotels(hotels: Vec<StoredHotel>) -> Self {
        Self {
            hotels: Mutex::new(hotels),
            ..Default::default()
        }
    }

    pub fn sample() -> Self {
        Self::with_hotels(vec![
            StoredHotel::new(1, "Grand Paris", 5, 9.1, "Paris", "France"),
            StoredHotel::new(2, "Tokyo Bay", 4, 8.7, "Tokyo", "Japan"),
            StoredHotel::new(3, "London Budget Inn", 2, 7.2, "London", "United Kingdom"),
            StoredHotel::new(4, "Seine View", 4, 8.7, "Paris", "France"),
        ])
    }

    pub fn field(&self, id: i64, name: &str) -> Option<Value> {
        self.hotels
            .lock()
            .iter()
            .find(|h| h.id == id)
            .and_then(|h| h.fields.get(name).cloned())
    }

    pub fn queries_matching(&self, needle: &str) -> usize {
        self.log.lock().iter().filter(|q| q.text().contains(needle)).count()
    }

    fn update(&self, query: &CypherQuery) {
        let Some(Value::Int(id)) = query.param_value("id") else {
            return;
        };
        let mut hotels = self.hotels.lock();
        if let Some(hotel) = hotels.iter_mut().find(|h| h.id == *id) {
            for (name, value) in query.params() {
                if name != "id" {
                    hotel.fields.insert(name.clone(), value.clone());
                }
            }
        }
    }

    fn fetch_hotels(&self, query: &CypherQuery) -> Vec<Record> {
        let required: Vec<&str> = ["search_text", "embedding", "embedding_v2"]
            .into_iter()
            .filter(|p| query.text().contains(&format!("h.{} IS NULL", p)))
            .collect();
        self.hotels
            .lock()
            .iter()
            .filter(|h| required.is_empty() || required.iter().any(|p| !h.fields.contains_key(*p)))
            .map(|h| {
                Record::new()
                    .with("id", h.id)
                    .with("name", h.name.as_str())
                    .with("stars", h.stars)
                    .with("clean", h.clean)
                    .with("comfort", h.comfort)
                    .with("facilities", h.facilities)
                    .with("city", h.city.as_str())
                    .with("country", h.country.as_str())
            })
            .collect()
    }

    fn text_search(&self, query: &CypherQuery) -> Vec<Record> {
        let terms: Vec<&str> = query
            .params()
            .iter()
            .filter(|(name, _)| name.starts_with("term_"))
            .filter_map(|(_, value)| value.as_text())
            .collect();
        let k = limit(query, "k");

        self.hotels
            .lock()
            .iter()
            .filter(|h| {
                h.fields
                    .get("search_text")
                    .and_then(Value::as_text)
                    .map(|text| terms.iter().any(|t| text.contains(t)))
                    .unwrap_or(false)
            })
            .take(k)
            .map(StoredHotel::result_row)
            .collect()
    }

    fn vector_search(&self, query: &CypherQuery) -> Vec<Record> {
        let property = match query.param_value("index_name").and_then(Value::as_text) {
            Some("hotel_embeddings_v2") => "embedding_v2",
            _ => "embedding",
        };
        let target = query
            .param_value("embedding")
            .and_then(Value::as_float_list)
            .map(<[f64]>::to_vec)
            .unwrap_or_default();

        let mut scored: Vec<(f64, Record)> = self
            .hotels
            .lock()
            .iter()
            .filter_map(|h| {
                let stored = h.fields.get(property)?.as_float_list()?;
                let score = cosine(stored, &target);
                Some((score, h.result_row().with("score", score)))
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().take(limit(query, "k")).map(|(_, r)| r).collect()
    }
}

fn limit(query: &CypherQuery, name: &str) -> usize {
    match query.param_value(name) {
        Some(Value::Int(v)) => *v as usize,
        _ => usize::MAX,
    }
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn run(&self, query: CypherQuery) -> RagResult<()> {
        if query.text().starts_with("CREATE") {
            if let Some(name) = query.text().split_whitespace().find(|w| w.starts_with("hotel_")) {
                self.indexes.lock().insert(name.to_string());
            }
        } else if query.text().contains(" SET ") {
            self.update(&query);
        }
        self.log.lock().push(query);
        Ok(())
    }

    async fn fetch(&self, query: CypherQuery) -> RagResult<Vec<Record>> {
        let text = query.text();
        let records = if text.contains("AS clean") {
            self.fetch_hotels(&query)
        } else if text.contains("CONTAINS") {
            self.text_search(&query)
        } else if text.contains("queryNodes") {
            self.vector_search(&query)
        } else {
            let limit = limit(&query, "limit");
            self.hotels.lock().iter().take(limit).map(StoredHotel::result_row).collect()
        };
        self.log.lock().push(query);
        Ok(records)
    }

    async fn close(&self) -> RagResult<()> {
        *self.closed.lock() += 1;
        Ok(())
    }
}

/// Deterministic bag-of-characters embedding.
pub struct HashEmbedding {
    id: String,
    dimension: usize,
}

impl HashEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            id: format!("hash-{}", dimension),
            dimension,
        }
    }
}

#[async_trait]
impl EmbeddingModel for HashEmbedding {
    fn model_id(&self) -> &str {
        &self.id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        for (i, byte) in text.to_lowercase().bytes().enumerate() {
            vector[(byte as usize * 31 + i % 7) % self.dimension] += 1.0;
        }
        Ok(normalize_vector(vector))
    }
}
