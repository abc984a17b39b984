use serde::{Deserialize, Serialize};

/// An action button offered on a notification.
///
/// `action_token` is an opaque token the presenter embeds in its protocol
/// launch arguments; this crate never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationAction {
    pub label: String,
    pub action_token: String,
}

/// A one-shot notification request handed to the presenting collaborator.
///
/// Carries a denormalized snapshot of the triggering event's fields so the
/// presenter never has to read pipeline state. Presentation (OS toast,
/// in-app banner) is entirely the collaborator's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub correlation_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NotificationAction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_roundtrip() {
        let req = NotificationRequest {
            title: "Squadrone Tracker".into(),
            body: "Docked at Jameson Memorial".into(),
            correlation_id: "128666762".into(),
            actions: vec![NotificationAction {
                label: "Open in App".into(),
                action_token: "action=viewDetails&marketId=128666762".into(),
            }],
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"correlationId\":\"128666762\""));
        assert!(json.contains("\"actionToken\""));
        let parsed: NotificationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req, parsed);
    }

    #[test]
    fn request_omits_empty_fields() {
        let req = NotificationRequest {
            title: "Squadrone Tracker".into(),
            body: "hello".into(),
            correlation_id: String::new(),
            actions: vec![],
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("correlationId"));
        assert!(!json.contains("actions"));
    }
}
