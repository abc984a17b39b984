//! Journal line decoding.
//!
//! One JSON record per line, self-describing via the `event` field. The
//! decoder checks structural well-formedness and the presence of that
//! discriminator, nothing else: field values are passed through for the
//! consumers to interpret. A single bad line is reported and skipped,
//! never fatal to the stream.

use squadrone_protocol::JournalEvent;

/// Decode failure for a single journal line.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The line is not a well-formed JSON object.
    #[error("malformed journal line: {reason}")]
    Malformed { reason: String, raw_line: String },

    /// The record parsed but carries no `event` discriminator.
    #[error("journal line missing `event` discriminator")]
    MissingDiscriminator { raw_line: String },
}

impl DecodeError {
    /// The offending line, verbatim.
    pub fn raw_line(&self) -> &str {
        match self {
            DecodeError::Malformed { raw_line, .. } => raw_line,
            DecodeError::MissingDiscriminator { raw_line } => raw_line,
        }
    }
}

/// Parses one journal line into an event.
pub fn decode(line: &str) -> Result<JournalEvent, DecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| DecodeError::Malformed {
            reason: e.to_string(),
            raw_line: line.to_string(),
        })?;

    if !value.is_object() {
        return Err(DecodeError::Malformed {
            reason: "not a JSON object".into(),
            raw_line: line.to_string(),
        });
    }

    if !value.get("event").is_some_and(|v| v.is_string()) {
        return Err(DecodeError::MissingDiscriminator {
            raw_line: line.to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| DecodeError::Malformed {
        reason: e.to_string(),
        raw_line: line.to_string(),
    })
}
