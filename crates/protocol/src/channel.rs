use serde::{Deserialize, Serialize};

use crate::journal::JournalEvent;

/// Typed messages carried over the internal channel between the dispatch
/// pipeline and the stream service.
///
/// The closed set of kinds lets both ends validate structurally instead of
/// inspecting payload shapes at runtime; new kinds extend the tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum ChannelMessage {
    /// Liveness greeting from the main process.
    Hello,
    /// Readiness acknowledgement from the stream service.
    Ready,
    /// A journal event pushed toward subscribers.
    Event(JournalEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_serializes_as_kind_only() {
        let json = serde_json::to_string(&ChannelMessage::Hello).unwrap();
        assert_eq!(json, r#"{"kind":"hello"}"#);
    }

    #[test]
    fn event_carries_payload() {
        let event: JournalEvent =
            serde_json::from_str(r#"{"timestamp":"2026-01-01T00:00:00Z","event":"FSDJump","StarSystem":"Sol"}"#)
                .unwrap();
        let json = serde_json::to_string(&ChannelMessage::Event(event.clone())).unwrap();
        assert!(json.contains("\"kind\":\"event\""));
        assert!(json.contains("\"payload\""));

        let parsed: ChannelMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ChannelMessage::Event(event));
    }

    #[test]
    fn ready_roundtrip() {
        let json = serde_json::to_string(&ChannelMessage::Ready).unwrap();
        let parsed: ChannelMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ChannelMessage::Ready);
    }
}
