//! Typed Cypher construction.
//!
//! Filters are built as predicate lists and compiled to query text in one
//! place. Every value becomes a bound parameter; only property paths (which
//! come from constants or validated configuration) are written into the text.

use super::Value;
use crate::errors::{RagError, RagResult};

/// A query string, its bound parameters, and the column aliases it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct CypherQuery {
    text: String,
    params: Vec<(String, Value)>,
    columns: Vec<String>,
}

impl CypherQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    pub fn params_from(mut self, params: Vec<(String, Value)>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn param_value(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

/// A property path such as `h.star_rating`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prop {
    var: &'static str,
    key: String,
}

impl Prop {
    pub fn new(var: &'static str, key: impl Into<String>) -> Self {
        let key = key.into();
        debug_assert!(travel_config::is_identifier(&key), "unsafe property name {key}");
        Self { var, key }
    }

    pub fn path(&self) -> String {
        format!("{}.{}", self.var, self.key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Prop, Value),
    Gte(Prop, Value),
    Lte(Prop, Value),
    Contains(Prop, Value),
    IsNull(Prop),
}

impl Predicate {
    /// Render with `param` as the placeholder name; returns the text and the
    /// value to bind, if any.
    fn render(&self, param: &str) -> (String, Option<Value>) {
        match self {
            Predicate::Eq(p, v) => (format!("{} = ${}", p.path(), param), Some(v.clone())),
            Predicate::Gte(p, v) => (format!("{} >= ${}", p.path(), param), Some(v.clone())),
            Predicate::Lte(p, v) => (format!("{} <= ${}", p.path(), param), Some(v.clone())),
            Predicate::Contains(p, v) => {
                (format!("{} CONTAINS ${}", p.path(), param), Some(v.clone()))
            }
            Predicate::IsNull(p) => (format!("{} IS NULL", p.path()), None),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Conjunction; an empty list means "no constraint".
    All(Vec<Predicate>),
    /// Disjunction; an empty list can never match and is rejected.
    Any(Vec<Predicate>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledFilter {
    /// `WHERE ...` or `None` when there is nothing to filter on.
    pub clause: Option<String>,
    pub params: Vec<(String, Value)>,
}

impl CompiledFilter {
    pub fn where_clause(&self) -> &str {
        self.clause.as_deref().unwrap_or("")
    }
}

impl Filter {
    /// Compile to a `WHERE` clause. Parameters are named `{prefix}{n}`,
    /// numbered over valued predicates only.
    pub fn compile(&self, prefix: &str) -> RagResult<CompiledFilter> {
        let (predicates, joiner) = match self {
            Filter::All(p) => (p, " AND "),
            Filter::Any(p) if p.is_empty() => {
                return Err(RagError::Query(
                    "refusing to build a disjunction with zero conditions".to_string(),
                ))
            }
            Filter::Any(p) => (p, " OR "),
        };

        if predicates.is_empty() {
            return Ok(CompiledFilter::default());
        }

        let mut conditions = Vec::with_capacity(predicates.len());
        let mut params = Vec::new();
        for predicate in predicates {
            let name = format!("{}{}", prefix, params.len());
            let (text, value) = predicate.render(&name);
            conditions.push(text);
            if let Some(value) = value {
                params.push((name, value));
            }
        }

        Ok(CompiledFilter {
            clause: Some(format!("WHERE {}", conditions.join(joiner))),
            params,
        })
    }
}
