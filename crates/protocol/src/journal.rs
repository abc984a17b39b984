use serde::{Deserialize, Serialize};

/// A single decoded journal event.
///
/// `kind` mirrors the journal's `event` discriminator field; everything
/// else the record carried is passed through opaquely in `fields`, so
/// consumers can pick out what they need without this crate knowing the
/// shape of every event the game emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEvent {
    #[serde(rename = "event")]
    pub kind: String,

    /// Event timestamp as written by the game (ISO-8601). Passed through
    /// verbatim; consumers decide whether to parse it.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timestamp: String,

    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl JournalEvent {
    /// Returns a passthrough field as a string, if present and a string.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }

    /// Returns a passthrough field as an integer, if present and numeric.
    pub fn field_i64(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(|v| v.as_i64())
    }
}
