//! Latest-known tracker state served to subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use squadrone_protocol::JournalEvent;

/// Snapshot returned on `get_status`.
///
/// Folded incrementally from the event stream: the location fields follow
/// the travel events, the counters every event. Overlays that only need
/// "where is the commander right now" never have to replay the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// When this service instance started.
    pub started_at: DateTime<Utc>,
    pub events_seen: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub commander: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ship: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub star_system: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub station: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_event: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_event_at: String,
}

impl StatusSnapshot {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            events_seen: 0,
            commander: String::new(),
            ship: String::new(),
            star_system: String::new(),
            station: String::new(),
            last_event: String::new(),
            last_event_at: String::new(),
        }
    }

    /// Folds one event into the snapshot.
    pub fn apply(&mut self, event: &JournalEvent) {
        self.events_seen += 1;
        self.last_event = event.kind.clone();
        self.last_event_at = event.timestamp.clone();

        match event.kind.as_str() {
            "LoadGame" => {
                if let Some(commander) = event.field_str("Commander") {
                    self.commander = commander.into();
                }
                if let Some(ship) = event.field_str("Ship") {
                    self.ship = ship.into();
                }
            }
            "Loadout" => {
                if let Some(ship) = event.field_str("Ship") {
                    self.ship = ship.into();
                }
            }
            "Location" => {
                if let Some(system) = event.field_str("StarSystem") {
                    self.star_system = system.into();
                }
            }
            "FSDJump" => {
                if let Some(system) = event.field_str("StarSystem") {
                    self.star_system = system.into();
                }
                // Jumping away always leaves the station behind.
                self.station.clear();
            }
            "Docked" => {
                if let Some(station) = event.field_str("StationName") {
                    self.station = station.into();
                }
                if let Some(system) = event.field_str("StarSystem") {
                    self.star_system = system.into();
                }
            }
            "Undocked" => self.station.clear(),
            _ => {}
        }
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
