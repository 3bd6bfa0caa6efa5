use thiserror::Error;
use travel_config::ConfigError;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Neo4j error: {0}")]
    Neo4j(String),

    #[error("Failed to load embedding model {model}: {reason}")]
    ModelLoad { model: String, reason: String },

    #[error("Query error: {0}")]
    Query(String),

    #[error("Index creation failed for {index}: {reason}")]
    IndexCreation { index: String, reason: String },

    #[error("Dimension mismatch for index {index}: expected {expected}, got {actual}")]
    DimensionMismatch {
        index: String,
        expected: usize,
        actual: usize,
    },

    #[error("Generation {requested} is not served by this index (available: {available})")]
    GenerationMismatch { requested: String, available: String },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Entity {id} is missing field {field}")]
    MissingField { id: String, field: &'static str },
}

impl RagError {
    /// Connection-level failures that may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, RagError::Connection(_))
    }
}

impl From<neo4rs::Error> for RagError {
    fn from(e: neo4rs::Error) -> Self {
        match e {
            neo4rs::Error::IOError { .. } | neo4rs::Error::ConnectionError => {
                RagError::Connection(e.to_string())
            }
            other => RagError::Neo4j(other.to_string()),
        }
    }
}

pub type RagResult<T> = Result<T, RagError>;
