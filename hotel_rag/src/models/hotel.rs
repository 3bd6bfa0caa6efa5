use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graph_db::{Record, Value};

/// A numeric property as stored in the graph. Integers and floats are kept
/// apart so canonical text renders them the way they were loaded (`9` vs `9.0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(v) => write!(f, "{}", v),
            Number::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(v) => Value::Int(v),
            Number::Float(v) => Value::Float(v),
        }
    }
}

/// A hotel joined with its city and country, as read by the embedding pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct HotelRecord {
    /// Identifier exactly as stored (integer or string), bound back unchanged on update.
    pub id: Value,
    pub name: String,
    pub stars: Number,
    pub cleanliness: Number,
    pub comfort: Number,
    pub facilities: Number,
    pub city: String,
    pub country: String,
}

/// Column aliases returned by the fetch query.
pub const HOTEL_COLUMNS: [&str; 8] = [
    "id", "name", "stars", "clean", "comfort", "facilities", "city", "country",
];

impl HotelRecord {
    /// Build from a fetch row. Every template field must be present; the
    /// error names the first missing one.
    pub fn from_record(record: &Record) -> Result<Self, (Value, &'static str)> {
        let id = record.get("id").cloned().unwrap_or(Value::Null);
        if id.is_null() {
            return Err((id, "id"));
        }

        let text = |field: &'static str| {
            record
                .text(field)
                .map(str::to_string)
                .ok_or_else(|| (id.clone(), field))
        };
        let number = |field: &'static str| record.number(field).ok_or_else(|| (id.clone(), field));

        Ok(Self {
            id: id.clone(),
            name: text("name")?,
            stars: number("stars")?,
            cleanliness: number("clean")?,
            comfort: number("comfort")?,
            facilities: number("facilities")?,
            city: text("city")?,
            country: text("country")?,
        })
    }
}
