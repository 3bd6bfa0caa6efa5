use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{InferenceClient, IntentExtractor};
use crate::errors::RagResult;
use crate::models::{EntitySlots, Intent};

const EXTRACTION_PROMPT: &str = "Classify the travel query below and extract its entities.\n\
Respond with a single JSON object and nothing else, in the form\n\
{\"intent\": \"search|recommendation|booking|info|other\", \"entities\": {\"city\": ..., \"country\": ..., \"hotel_name\": ..., \"star_rating\": ..., \"min_rating\": ..., \"budget\": ...}}\n\
Use null for entities that are not mentioned.\n\nQuery: ";

#[derive(Debug, Deserialize)]
struct Extraction {
    intent: String,
    #[serde(default)]
    entities: Option<EntitySlots>,
}

/// Intent extraction by prompting a generative model for JSON.
pub struct LlmIntentExtractor {
    client: Arc<dyn InferenceClient>,
    model: String,
}

impl LlmIntentExtractor {
    pub fn new(client: Arc<dyn InferenceClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

/// Parse the first `{ ... }` span of a model reply. Replies that do not hold
/// valid JSON yield `None`.
pub fn parse_extraction(reply: &str) -> Option<(Intent, EntitySlots)> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }

    let extraction: Extraction = serde_json::from_str(&reply[start..=end]).ok()?;
    Some((
        Intent::parse_lenient(&extraction.intent),
        extraction.entities.unwrap_or_default(),
    ))
}

#[async_trait]
impl IntentExtractor for LlmIntentExtractor {
    async fn extract(&self, query: &str) -> RagResult<(Intent, EntitySlots)> {
        let prompt = format!("{}{}", EXTRACTION_PROMPT, query.trim());
        let reply = self.client.complete(&self.model, &prompt).await?;

        match parse_extraction(&reply) {
            Some((intent, slots)) => {
                debug!(%intent, slots = %slots.summary(), "Extracted intent");
                Ok((intent, slots))
            }
            None => {
                warn!(reply = %reply, "Could not parse intent extraction; falling back to `other`");
                Ok((Intent::Other, EntitySlots::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SlotValue;

    struct CannedClient(&'static str);

    #[async_trait]
    impl InferenceClient for CannedClient {
        async fn complete(&self, _model: &str, prompt: &str) -> RagResult<String> {
            assert!(prompt.ends_with("Query: luxury hotels in Paris"));
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "```json\n{\"intent\": \"Search\", \"entities\": {\"city\": \"Paris\", \"star_rating\": 5, \"budget\": null}}\n```";
        let (intent, slots) = parse_extraction(reply).unwrap();

        assert_eq!(intent, Intent::Search);
        assert_eq!(slots.get("city"), Some(&SlotValue::Text("Paris".into())));
        assert_eq!(slots.get("star_rating").and_then(SlotValue::as_i64), Some(5));
        assert!(slots.get("budget").is_none());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse_extraction("I think the user wants a hotel").is_none());
        assert!(parse_extraction("} {").is_none());

        let (intent, slots) = parse_extraction(r#"{"intent": "info", "entities": null}"#).unwrap();
        assert_eq!(intent, Intent::Info);
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_reply_falls_back_to_other() {
        let extractor = LlmIntentExtractor::new(Arc::new(CannedClient("no idea")), "m");
        let (intent, slots) = extractor.extract("luxury hotels in Paris").await.unwrap();
        assert_eq!(intent, Intent::Other);
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn test_extract_through_client() {
        let extractor = LlmIntentExtractor::new(
            Arc::new(CannedClient(r#"{"intent": "recommendation", "entities": {"city": "Paris"}}"#)),
            "m",
        );
        let (intent, slots) = extractor.extract("luxury hotels in Paris").await.unwrap();
        assert_eq!(intent, Intent::Recommendation);
        assert_eq!(slots.summary(), "city=Paris");
    }
}
