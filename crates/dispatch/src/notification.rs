//! Notification side-effect rules.
//!
//! Maps designated event kinds to one-shot notification requests. Each
//! request carries a denormalized copy of the triggering event's fields so
//! the presenter never has to read pipeline state. Presentation itself
//! (OS toast, in-app banner) belongs to the collaborator implementing
//! [`NotificationSink`].

use squadrone_protocol::{JournalEvent, NotificationAction, NotificationRequest};

/// Title shared by all tracker notifications.
const NOTIFICATION_TITLE: &str = "Squadrone Tracker";

/// Presents notification requests to the user.
pub trait NotificationSink: Send + Sync {
    fn present(&self, request: NotificationRequest);
}

/// Builds the notification request for `event`, if its kind is one of the
/// designated triggers. At most one request per event.
pub fn request_for(event: &JournalEvent) -> Option<NotificationRequest> {
    match event.kind.as_str() {
        "Docked" => Some(docked_request(event)),
        _ => None,
    }
}

fn docked_request(event: &JournalEvent) -> NotificationRequest {
    let station = event.field_str("StationName").unwrap_or("unknown station");
    let market_id = event
        .field_i64("MarketID")
        .map(|id| id.to_string())
        .unwrap_or_default();

    NotificationRequest {
        title: NOTIFICATION_TITLE.into(),
        body: format!("Docked at {station}"),
        correlation_id: market_id.clone(),
        actions: vec![
            NotificationAction {
                label: "Open in App".into(),
                action_token: format!("action=viewDetails&marketId={market_id}"),
            },
            NotificationAction {
                label: "Open on Inara".into(),
                action_token: format!("action=openInara&marketId={market_id}"),
            },
        ],
    }
}
