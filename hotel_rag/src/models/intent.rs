use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Classified purpose of a query. Gates which retrieval paths run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Search,
    Recommendation,
    Booking,
    Info,
    Other,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Search => "search",
            Intent::Recommendation => "recommendation",
            Intent::Booking => "booking",
            Intent::Info => "info",
            Intent::Other => "other",
        }
    }

    /// Whether semantic (similarity index) retrieval runs for this intent.
    pub fn uses_semantic_search(&self) -> bool {
        matches!(self, Intent::Search | Intent::Recommendation)
    }

    /// Lenient parse for model output; anything unrecognised is `Other`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(Intent::Other)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "search" => Ok(Intent::Search),
            "recommendation" | "recommend" => Ok(Intent::Recommendation),
            "booking" | "book" => Ok(Intent::Booking),
            "info" | "information" => Ok(Intent::Info),
            "other" => Ok(Intent::Other),
            other => Err(format!("unknown intent: {}", other)),
        }
    }
}

/// A loosely-typed slot value as produced by entity extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SlotValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SlotValue::Text(s) => Some(s.trim()).filter(|s| !s.is_empty()),
            _ => None,
        }
    }

    /// Integer view; integral floats and numeric strings are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SlotValue::Int(v) => Some(*v),
            SlotValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            SlotValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SlotValue::Int(v) => Some(*v as f64),
            SlotValue::Float(v) => Some(*v),
            SlotValue::Text(s) => s.trim().parse().ok(),
            SlotValue::Bool(_) => None,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, SlotValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotValue::Bool(v) => write!(f, "{}", v),
            SlotValue::Int(v) => write!(f, "{}", v),
            SlotValue::Float(v) => write!(f, "{}", v),
            SlotValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for SlotValue {
    fn from(s: &str) -> Self {
        SlotValue::Text(s.to_string())
    }
}

impl From<String> for SlotValue {
    fn from(s: String) -> Self {
        SlotValue::Text(s)
    }
}

impl From<i64> for SlotValue {
    fn from(v: i64) -> Self {
        SlotValue::Int(v)
    }
}

impl From<f64> for SlotValue {
    fn from(v: f64) -> Self {
        SlotValue::Float(v)
    }
}

type SlotMap = BTreeMap<String, Option<SlotValue>>;

/// Slot name to optional value. Only populated slots take part in filtering.
///
/// Names are lower-cased on every way in, deserialization included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SlotMap", into = "SlotMap")]
pub struct EntitySlots(SlotMap);

impl From<SlotMap> for EntitySlots {
    fn from(raw: SlotMap) -> Self {
        let mut slots = Self::default();
        for (name, value) in raw {
            slots.set(&name, value);
        }
        slots
    }
}

impl From<EntitySlots> for SlotMap {
    fn from(slots: EntitySlots) -> Self {
        slots.0
    }
}

impl EntitySlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<SlotValue>) -> Self {
        self.set(name, Some(value.into()));
        self
    }

    /// Slot names are normalised to lower case.
    pub fn set(&mut self, name: &str, value: Option<SlotValue>) {
        self.0.insert(name.trim().to_lowercase(), value);
    }

    pub fn get(&self, name: &str) -> Option<&SlotValue> {
        self.0
            .get(&name.to_lowercase())
            .and_then(Option::as_ref)
            .filter(|v| !v.is_blank())
    }

    /// Populated slots in name order. Absent and blank values are skipped.
    pub fn populated(&self) -> impl Iterator<Item = (&str, &SlotValue)> {
        self.0.iter().filter_map(|(name, value)| match value {
            Some(v) if !v.is_blank() => Some((name.as_str(), v)),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.populated().next().is_none()
    }

    /// `city=Paris, star_rating=5` for log lines.
    pub fn summary(&self) -> String {
        self.populated()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_gate() {
        assert!(Intent::Search.uses_semantic_search());
        assert!(Intent::Recommendation.uses_semantic_search());
        assert!(!Intent::Booking.uses_semantic_search());
        assert!(!Intent::Info.uses_semantic_search());
        assert!(!Intent::Other.uses_semantic_search());
    }

    #[test]
    fn test_intent_parsing() {
        assert_eq!(Intent::parse_lenient(" Recommendation "), Intent::Recommendation);
        assert_eq!(Intent::parse_lenient("weather"), Intent::Other);
    }

    #[test]
    fn test_populated_skips_absent_and_blank() {
        let mut slots = EntitySlots::new().with("City", "Paris").with("country", "  ");
        slots.set("budget", None);

        let populated: Vec<_> = slots.populated().map(|(k, _)| k).collect();
        assert_eq!(populated, vec!["city"]);
        assert_eq!(slots.get("CITY"), Some(&SlotValue::Text("Paris".into())));
        assert!(slots.get("country").is_none());
        assert_eq!(slots.summary(), "city=Paris");
    }

    #[test]
    fn test_slots_deserialize_from_loose_json() {
        let slots: EntitySlots = serde_json::from_str(
            r#"{"city": "London", "star_rating": 4, "min_rating": 8.5, "budget": null}"#,
        )
        .unwrap();

        assert_eq!(slots.get("star_rating").and_then(SlotValue::as_i64), Some(4));
        assert_eq!(slots.get("min_rating").and_then(SlotValue::as_f64), Some(8.5));
        assert!(slots.get("budget").is_none());
    }

    #[test]
    fn test_deserialized_names_are_case_insensitive() {
        let slots: EntitySlots =
            serde_json::from_str(r#"{"City": "Paris", "Star_Rating": 5}"#).unwrap();

        assert_eq!(slots.get("city"), Some(&SlotValue::Text("Paris".into())));
        assert_eq!(slots.summary(), "city=Paris, star_rating=5");
        assert_eq!(serde_json::to_string(&slots).unwrap(), r#"{"city":"Paris","star_rating":5}"#);
    }

    #[test]
    fn test_slot_coercions() {
        assert_eq!(SlotValue::Text(" 5 ".into()).as_i64(), Some(5));
        assert_eq!(SlotValue::Float(4.0).as_i64(), Some(4));
        assert_eq!(SlotValue::Float(4.5).as_i64(), None);
        assert_eq!(SlotValue::Text("five".into()).as_i64(), None);
        assert_eq!(SlotValue::Bool(true).as_f64(), None);
    }
}
