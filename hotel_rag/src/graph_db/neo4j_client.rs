use async_trait::async_trait;
use neo4rs::{query, BoltType, ConfigBuilder, Graph, Row};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use travel_config::Neo4jSettings;
use travel_observability::{log_db, log_retry};

use super::{CypherQuery, GraphStore, Record, Value};
use crate::errors::{RagError, RagResult};

/// Neo4j client compatible with both local Neo4j and Neo4j AuraDB.
///
/// The driver is held for the life of the process. `close()` releases it
/// explicitly; dropping the client releases it on every other exit path.
pub struct Neo4jClient {
    graph: Mutex<Option<Arc<Graph>>>,
    uri: String,
}

impl Neo4jClient {
    /// Connect, retrying transient connection failures with exponential backoff.
    ///
    /// # Arguments
    /// * `settings` - URI (`bolt://`, `neo4j://`, `neo4j+s://`), credentials,
    ///   database name and retry policy
    pub async fn connect(settings: &Neo4jSettings) -> RagResult<Self> {
        tracing::info!("Connecting to Neo4j at: {}", settings.uri);

        let mut attempt = 0;
        let mut delay = Duration::from_millis(settings.backoff_ms);
        let graph = loop {
            match Self::open(settings).await {
                Ok(graph) => break graph,
                Err(e) if e.is_transient() && attempt < settings.max_retries => {
                    attempt += 1;
                    log_retry!("neo4j_connect", attempt, settings.max_retries, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        };

        tracing::info!("Neo4j connection established");
        Ok(Self {
            graph: Mutex::new(Some(Arc::new(graph))),
            uri: settings.uri.clone(),
        })
    }

    async fn open(settings: &Neo4jSettings) -> RagResult<Graph> {
        let config = ConfigBuilder::default()
            .uri(settings.uri.as_str())
            .user(settings.username.as_str())
            .password(settings.password.as_str())
            .db(settings.database.as_str())
            .fetch_size(500)
            .max_connections(10)
            .build()
            .map_err(|e| RagError::Neo4j(format!("Failed to build Neo4j config: {}", e)))?;

        let graph = Graph::connect(config).await?;

        // Test the connection
        let mut result = graph.execute(query("RETURN 1 AS test")).await?;
        result.next().await?;

        Ok(graph)
    }

    /// Get the connection URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn is_open(&self) -> bool {
        self.graph.lock().is_some()
    }

    fn handle(&self) -> RagResult<Arc<Graph>> {
        self.graph
            .lock()
            .clone()
            .ok_or_else(|| RagError::Connection("connection is closed".to_string()))
    }

    fn to_neo4rs(cypher: &CypherQuery) -> neo4rs::Query {
        cypher
            .params()
            .iter()
            .fold(query(cypher.text()), |q, (name, value)| {
                q.param(name, to_bolt(value))
            })
    }
}

fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(neo4rs::BoltNull),
        Value::Bool(v) => (*v).into(),
        Value::Int(v) => (*v).into(),
        Value::Float(v) => (*v).into(),
        Value::Text(v) => v.clone().into(),
        Value::FloatList(v) => v.clone().into(),
    }
}

/// Read one column, trying the types the engine stores in turn.
fn read_value(row: &Row, column: &str) -> RagResult<Value> {
    if let Ok(v) = row.get::<Option<i64>>(column) {
        return Ok(v.map(Value::Int).unwrap_or(Value::Null));
    }
    if let Ok(Some(v)) = row.get::<Option<f64>>(column) {
        return Ok(Value::Float(v));
    }
    if let Ok(Some(v)) = row.get::<Option<String>>(column) {
        return Ok(Value::Text(v));
    }
    if let Ok(Some(v)) = row.get::<Option<bool>>(column) {
        return Ok(Value::Bool(v));
    }
    if let Ok(Some(v)) = row.get::<Option<Vec<f64>>>(column) {
        return Ok(Value::FloatList(v));
    }
    Err(RagError::Neo4j(format!(
        "column `{}` is missing or has an unsupported type",
        column
    )))
}

#[async_trait]
impl GraphStore for Neo4jClient {
    async fn run(&self, cypher: CypherQuery) -> RagResult<()> {
        let graph = self.handle()?;
        log_db!("run", cypher.text());
        graph.run(Self::to_neo4rs(&cypher)).await?;
        Ok(())
    }

    async fn fetch(&self, cypher: CypherQuery) -> RagResult<Vec<Record>> {
        let graph = self.handle()?;
        log_db!("fetch", cypher.text());

        let mut result = graph.execute(Self::to_neo4rs(&cypher)).await?;
        let mut records = Vec::new();
        while let Some(row) = result.next().await? {
            let mut record = Record::new();
            for column in cypher.columns() {
                record.insert(column, read_value(&row, column)?);
            }
            records.push(record);
        }

        Ok(records)
    }

    async fn close(&self) -> RagResult<()> {
        if self.graph.lock().take().is_some() {
            tracing::info!(uri = %self.uri, "Neo4j connection released");
        }
        Ok(())
    }
}

impl Drop for Neo4jClient {
    fn drop(&mut self) {
        if self.graph.get_mut().take().is_some() {
            tracing::debug!(uri = %self.uri, "Neo4j connection released on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires a running Neo4j (NEO4J_PASSWORD must be set)
    async fn test_connect_and_close_is_idempotent() {
        let config = travel_config::AppConfig::from_env().expect("config");
        let client = Neo4jClient::connect(&config.neo4j).await.expect("connect");

        let rows = client
            .fetch(CypherQuery::new("RETURN 1 AS one, 'x' AS label").returning(&["one", "label"]))
            .await
            .expect("fetch");
        assert_eq!(rows[0].get("one"), Some(&Value::Int(1)));
        assert_eq!(rows[0].text("label"), Some("x"));

        client.close().await.unwrap();
        client.close().await.unwrap();
        assert!(!client.is_open());
        assert!(matches!(
            client.run(CypherQuery::new("RETURN 1")).await,
            Err(RagError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_after_bounded_retries() {
        let settings = Neo4jSettings {
            uri: "bolt://127.0.0.1:1".to_string(),
            username: "neo4j".to_string(),
            password: "password".to_string(),
            database: "neo4j".to_string(),
            max_retries: 1,
            backoff_ms: 1,
        };

        let result = Neo4jClient::connect(&settings).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_bolt_conversion_covers_all_values() {
        assert!(matches!(to_bolt(&Value::Null), BoltType::Null(_)));
        assert!(matches!(to_bolt(&Value::Int(3)), BoltType::Integer(_)));
        assert!(matches!(to_bolt(&Value::Float(0.5)), BoltType::Float(_)));
        assert!(matches!(to_bolt(&Value::from("x")), BoltType::String(_)));
        assert!(matches!(to_bolt(&Value::FloatList(vec![0.1, 0.2])), BoltType::List(_)));
    }
}
