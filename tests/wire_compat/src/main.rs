fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture file as a raw JSON string.
    fn load_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and
    /// compares the two as JSON values (order-independent).
    ///
    /// Guards the subscriber-facing wire format: a field rename or a
    /// casing change in the protocol types breaks one of these before it
    /// breaks an overlay.
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_str(&fixture)
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_string(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        let fixture_value: serde_json::Value = serde_json::from_str(&fixture).unwrap();
        let reserialized_value: serde_json::Value =
            serde_json::from_str(&reserialized).unwrap();
        assert_eq!(
            fixture_value, reserialized_value,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
    }

    // --- Protocol type tests ---

    #[test]
    fn fixture_docked_event() {
        roundtrip_test::<squadrone_protocol::JournalEvent>("docked_event.json");
    }

    #[test]
    fn fixture_fsd_jump_event() {
        roundtrip_test::<squadrone_protocol::JournalEvent>("fsd_jump_event.json");
    }

    #[test]
    fn fixture_message_envelope() {
        roundtrip_test::<squadrone_protocol::Message>("message_envelope.json");
    }

    #[test]
    fn fixture_error_envelope() {
        roundtrip_test::<squadrone_protocol::Message>("error_envelope.json");
    }

    #[test]
    fn fixture_notification_request() {
        roundtrip_test::<squadrone_protocol::NotificationRequest>("notification_request.json");
    }

    #[test]
    fn fixture_channel_event() {
        roundtrip_test::<squadrone_protocol::ChannelMessage>("channel_event.json");
    }

    #[test]
    fn fixture_status_snapshot() {
        roundtrip_test::<squadrone_stream::StatusSnapshot>("status_snapshot.json");
    }

    // --- Cross-type checks ---

    #[test]
    fn envelope_payload_parses_as_journal_event() {
        let fixture = load_fixture("message_envelope.json");
        let msg: squadrone_protocol::Message = serde_json::from_str(&fixture).unwrap();
        assert_eq!(msg.msg_type, squadrone_protocol::MessageType::Event);

        let event: squadrone_protocol::JournalEvent = msg.parse_payload().unwrap().unwrap();
        assert_eq!(event.kind, "Docked");
        assert_eq!(event.field_i64("MarketID"), Some(128666762));
    }

    #[test]
    fn docked_fixture_produces_notification_fixture() {
        // The Docked event fixture and the notification fixture must stay
        // in sync: one is derived from the other at dispatch time.
        let event: squadrone_protocol::JournalEvent =
            serde_json::from_str(&load_fixture("docked_event.json")).unwrap();
        let expected: squadrone_protocol::NotificationRequest =
            serde_json::from_str(&load_fixture("notification_request.json")).unwrap();

        let built = squadrone_dispatch::notification::request_for(&event).unwrap();
        assert_eq!(built, expected);
    }
}
