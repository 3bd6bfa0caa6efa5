//! Process configuration for the hotel retrieval engine.
//!
//! Values come from the environment (after loading `.env`) and from the JSON
//! feature toggles file. Everything that used to be process-wide state, such
//! as log verbosity, is carried on [`AppConfig`] and handed to constructors.

pub mod feature_toggles;

use feature_toggles::FeatureToggles;
use thiserror::Error;

pub const DEFAULT_NEO4J_URI: &str = "neo4j://localhost:7687";
pub const DEFAULT_NEO4J_USERNAME: &str = "neo4j";
pub const DEFAULT_NEO4J_DATABASE: &str = "neo4j";
pub const DEFAULT_EMBEDDING_MODEL_V1: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_MODEL_V2: &str = "sentence-transformers/all-mpnet-base-v2";
pub const DEFAULT_INFERENCE_MODEL: &str = "microsoft/DialoGPT-medium";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not found in environment")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Which similarity index generation serves semantic search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStrategy {
    Lexical,
    Dense,
}

impl IndexStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexStrategy::Lexical => "lexical",
            IndexStrategy::Dense => "dense",
        }
    }
}

/// Log verbosity: 0 = minimal, 1 = normal, 2 = detailed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verbosity(u8);

impl Verbosity {
    pub fn new(level: u8) -> Self {
        Self(level.min(2))
    }

    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self(1)
    }
}

#[derive(Debug, Clone)]
pub struct Neo4jSettings {
    pub uri: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_retries: u32,
    pub backoff_ms: u64,
}

/// Node label and identifier property of the hotel nodes. Both are spliced
/// into query text, so they are validated as plain identifiers on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSchema {
    pub hotel_label: String,
    pub id_property: String,
}

impl Default for GraphSchema {
    fn default() -> Self {
        Self {
            hotel_label: "Hotel".to_string(),
            id_property: "hotel_id".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexSettings {
    pub strategy: IndexStrategy,
    pub model_v1: String,
    /// `None` when the 768-dim generation is disabled.
    pub model_v2: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub neo4j: Neo4jSettings,
    pub schema: GraphSchema,
    pub index: IndexSettings,
    pub hf_token: Option<String>,
    pub inference_model: String,
    pub verbosity: Verbosity,
    pub baseline_limit: usize,
    pub semantic_top_k: usize,
    pub progress_every: usize,
    pub feature_toggles: FeatureToggles,
}

impl AppConfig {
    /// Load `.env`, then read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let toggles = FeatureToggles::from_env_path();
        Self::from_lookup(|key| std::env::var(key).ok(), toggles)
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F, feature_toggles: FeatureToggles) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let password = var("NEO4J_PASSWORD").ok_or(ConfigError::MissingVar("NEO4J_PASSWORD"))?;

        let neo4j = Neo4jSettings {
            uri: var("NEO4J_URI").unwrap_or_else(|| DEFAULT_NEO4J_URI.to_string()),
            username: var("NEO4J_USERNAME").unwrap_or_else(|| DEFAULT_NEO4J_USERNAME.to_string()),
            password,
            database: var("NEO4J_DATABASE").unwrap_or_else(|| DEFAULT_NEO4J_DATABASE.to_string()),
            max_retries: parse_or("CONNECT_MAX_RETRIES", var("CONNECT_MAX_RETRIES"), 3)?,
            backoff_ms: parse_or("CONNECT_BACKOFF_MS", var("CONNECT_BACKOFF_MS"), 200)?,
        };

        let schema = GraphSchema {
            hotel_label: identifier("HOTEL_LABEL", var("HOTEL_LABEL"), "Hotel")?,
            id_property: identifier("HOTEL_ID_PROPERTY", var("HOTEL_ID_PROPERTY"), "hotel_id")?,
        };

        let strategy = match var("SIMILARITY_INDEX").map(|v| v.to_lowercase()) {
            Some(v) if v == "lexical" => IndexStrategy::Lexical,
            Some(v) if v == "dense" => IndexStrategy::Dense,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "SIMILARITY_INDEX",
                    value: other,
                    reason: "expected `lexical` or `dense`".to_string(),
                })
            }
            None if feature_toggles.dense_index_enabled() => IndexStrategy::Dense,
            None => IndexStrategy::Lexical,
        };

        let v2_enabled = match var("ENABLE_EMBEDDING_V2") {
            Some(v) => parse_bool("ENABLE_EMBEDDING_V2", &v)?,
            None => feature_toggles.dense_v2_enabled(),
        };

        let index = IndexSettings {
            strategy,
            model_v1: var("EMBEDDING_MODEL_V1").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL_V1.to_string()),
            model_v2: v2_enabled.then(|| {
                var("EMBEDDING_MODEL_V2").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL_V2.to_string())
            }),
        };

        let verbosity = Verbosity::new(parse_or("VERBOSITY", var("VERBOSITY"), 1u8)?);

        Ok(Self {
            neo4j,
            schema,
            index,
            hf_token: var("HF_TOKEN"),
            inference_model: var("INFERENCE_MODEL").unwrap_or_else(|| DEFAULT_INFERENCE_MODEL.to_string()),
            verbosity,
            baseline_limit: parse_or("BASELINE_LIMIT", var("BASELINE_LIMIT"), 10)?,
            semantic_top_k: parse_or("SEMANTIC_TOP_K", var("SEMANTIC_TOP_K"), 3)?,
            progress_every: parse_or("POPULATE_PROGRESS_EVERY", var("POPULATE_PROGRESS_EVERY"), 100)?,
            feature_toggles,
        })
    }

    /// The HuggingFace token, or a configuration error naming it.
    pub fn require_hf_token(&self) -> Result<&str, ConfigError> {
        self.hf_token.as_deref().ok_or(ConfigError::MissingVar("HF_TOKEN"))
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::InvalidValue {
                name,
                reason: e.to_string(),
                value,
            }),
        },
        None => Ok(default),
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn identifier(name: &'static str, raw: Option<String>, default: &str) -> Result<String, ConfigError> {
    let value = raw.unwrap_or_else(|| default.to_string());
    if is_identifier(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            name,
            value,
            reason: "must match [A-Za-z_][A-Za-z0-9_]*".to_string(),
        })
    }
}

/// True for names that are safe to splice into Cypher without quoting.
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_password_is_fatal() {
        let err = AppConfig::from_lookup(lookup(&[]), FeatureToggles::default()).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("NEO4J_PASSWORD"));
    }

    #[test]
    fn test_blank_password_counts_as_missing() {
        let err = AppConfig::from_lookup(lookup(&[("NEO4J_PASSWORD", "  ")]), FeatureToggles::default())
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("NEO4J_PASSWORD"));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("NEO4J_PASSWORD", "secret")]), FeatureToggles::default())
            .unwrap();

        assert_eq!(config.neo4j.uri, DEFAULT_NEO4J_URI);
        assert_eq!(config.neo4j.username, "neo4j");
        assert_eq!(config.schema, GraphSchema::default());
        assert_eq!(config.index.strategy, IndexStrategy::Lexical);
        assert!(config.index.model_v2.is_none());
        assert_eq!(config.verbosity.level(), 1);
        assert_eq!(config.semantic_top_k, 3);
        assert_eq!(config.baseline_limit, 10);
        assert!(config.require_hf_token().is_err());
    }

    #[test]
    fn test_dense_selected_by_toggle_and_overridden_by_env() {
        let mut toggles = FeatureToggles::default();
        toggles.flags.insert("DenseIndex".to_string(), true);
        toggles.flags.insert("DenseV2".to_string(), true);

        let config = AppConfig::from_lookup(lookup(&[("NEO4J_PASSWORD", "x")]), toggles.clone()).unwrap();
        assert_eq!(config.index.strategy, IndexStrategy::Dense);
        assert_eq!(config.index.model_v2.as_deref(), Some(DEFAULT_EMBEDDING_MODEL_V2));

        let config = AppConfig::from_lookup(
            lookup(&[("NEO4J_PASSWORD", "x"), ("SIMILARITY_INDEX", "LEXICAL")]),
            toggles,
        )
        .unwrap();
        assert_eq!(config.index.strategy, IndexStrategy::Lexical);
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = AppConfig::from_lookup(
            lookup(&[("NEO4J_PASSWORD", "x"), ("SEMANTIC_TOP_K", "three")]),
            FeatureToggles::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "SEMANTIC_TOP_K", .. }));

        let err = AppConfig::from_lookup(
            lookup(&[("NEO4J_PASSWORD", "x"), ("HOTEL_LABEL", "Hotel) DETACH DELETE (n")]),
            FeatureToggles::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "HOTEL_LABEL", .. }));
    }

    #[test]
    fn test_verbosity_is_clamped() {
        let config = AppConfig::from_lookup(
            lookup(&[("NEO4J_PASSWORD", "x"), ("VERBOSITY", "7")]),
            FeatureToggles::default(),
        )
        .unwrap();
        assert_eq!(config.verbosity.level(), 2);
    }

    #[test]
    fn test_identifier_check() {
        assert!(is_identifier("Hotel"));
        assert!(is_identifier("_hotel_id2"));
        assert!(!is_identifier("2hotel"));
        assert!(!is_identifier("hotel-id"));
        assert!(!is_identifier(""));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("NEO4J_PASSWORD", "from-env");
        std::env::set_var("NEO4J_URI", "bolt://graph:7687");
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.neo4j.password, "from-env");
        assert_eq!(config.neo4j.uri, "bolt://graph:7687");
        std::env::remove_var("NEO4J_PASSWORD");
        std::env::remove_var("NEO4J_URI");
    }
}
