pub mod neo4j_client;
pub mod query;

pub use neo4j_client::Neo4jClient;
pub use query::{CompiledFilter, CypherQuery, Filter, Predicate, Prop};

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::errors::{RagError, RagResult};
use crate::models::Number;

/// Connection to the graph store: parameterized query execution plus an
/// explicit, idempotent release.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Execute a query whose rows are not needed (DDL, updates).
    async fn run(&self, query: CypherQuery) -> RagResult<()>;

    /// Execute a query and read back the columns it declares.
    async fn fetch(&self, query: CypherQuery) -> RagResult<Vec<Record>>;

    /// Release the connection. Safe to call any number of times.
    async fn close(&self) -> RagResult<()>;
}

/// A scalar or list value, used both for bound parameters and for row fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    FloatList(Vec<f64>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match *self {
            Value::Int(v) => Some(Number::Int(v)),
            Value::Float(v) => Some(Number::Float(v)),
            _ => None,
        }
    }

    pub fn as_float_list(&self) -> Option<&[f64]> {
        match self {
            Value::FloatList(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", Number::Float(*v)),
            Value::Text(v) => f.write_str(v),
            Value::FloatList(v) => write!(f, "[{} floats]", v.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Vec<f32>> for Value {
    fn from(v: Vec<f32>) -> Self {
        Value::FloatList(v.into_iter().map(f64::from).collect())
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::FloatList(v)
    }
}

/// One result row keyed by column alias.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.insert(column, value.into());
        self
    }

    pub fn insert(&mut self, column: &str, value: Value) {
        self.fields.insert(column.to_string(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_text)
    }

    pub fn number(&self, column: &str) -> Option<Number> {
        self.get(column).and_then(Value::as_number)
    }
}

/// Neo4j reports an existing equivalent index as an error on some versions
/// even with `IF NOT EXISTS`; treat that as success.
pub fn is_already_exists(err: &RagError) -> bool {
    let message = err.to_string();
    message.contains("EquivalentSchemaRuleAlreadyExists")
        || message.contains("IndexAlreadyExists")
        || message.to_lowercase().contains("already exists")
}
