use serde::Serialize;

use super::Number;
use crate::graph_db::Record;

/// One retrieved hotel. `score` means different things per source: absent for
/// baseline results, a constant placeholder for the text index, and cosine
/// similarity for vector indexes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub name: String,
    pub stars: Option<Number>,
    pub rating: Option<Number>,
    pub score: Option<f64>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl SearchResult {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stars: None,
            rating: None,
            score: None,
            city: None,
            country: None,
        }
    }

    /// Read from a row aliased `hotel, stars, rating[, score, city, country]`.
    /// Rows without a hotel name are dropped.
    pub fn from_record(record: &Record) -> Option<Self> {
        let name = record.text("hotel")?.to_string();
        Some(Self {
            name,
            stars: record.number("stars"),
            rating: record.number("rating"),
            score: record.number("score").map(|n| n.as_f64()),
            city: record.text("city").map(str::to_string),
            country: record.text("country").map(str::to_string),
        })
    }

    pub fn with_stars(mut self, stars: i64) -> Self {
        self.stars = Some(Number::Int(stars));
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(Number::Float(rating));
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Null sorts above every value, matching Cypher ordering.
    pub(crate) fn stars_key(&self) -> f64 {
        self.stars.map(|n| n.as_f64()).unwrap_or(f64::INFINITY)
    }

    pub(crate) fn rating_key(&self) -> f64 {
        self.rating.map(|n| n.as_f64()).unwrap_or(f64::INFINITY)
    }
}
