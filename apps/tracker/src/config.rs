//! Tracker configuration.
//!
//! Stored as JSON at `<config dir>/squadrone/config.json`. A missing or
//! unparsable file falls back to defaults; every field is individually
//! optional so old config files keep working as fields are added.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default port for the stream server.
const DEFAULT_STREAM_PORT: u16 = 8765;

/// Tracker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Directory containing the game's journal files.
    #[serde(default = "default_journal_dir")]
    pub journal_dir: PathBuf,

    /// Address the stream server binds. Loopback by default; widening this
    /// deliberately exposes the stream to the local network.
    #[serde(default = "default_stream_bind")]
    pub stream_bind: IpAddr,

    /// Stream server port (0 = OS-assigned).
    #[serde(default = "default_stream_port")]
    pub stream_port: u16,

    /// Whether docking notifications are presented.
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            journal_dir: default_journal_dir(),
            stream_bind: default_stream_bind(),
            stream_port: default_stream_port(),
            notifications_enabled: true,
        }
    }
}

impl TrackerConfig {
    /// Loads configuration from the config file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "failed to parse config, using defaults: {e}"
                );
                Ok(Self::default())
            }
        }
    }

    /// Saves configuration back to the config file.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, &json)?;
        tracing::debug!("configuration saved");
        Ok(())
    }
}

/// The game writes journals under the user's saved-games directory.
fn default_journal_dir() -> PathBuf {
    home_dir()
        .join("Saved Games")
        .join("Frontier Developments")
        .join("Elite Dangerous")
}

fn default_stream_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_stream_port() -> u16 {
    DEFAULT_STREAM_PORT
}

fn default_true() -> bool {
    true
}

fn home_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        PathBuf::from(std::env::var("USERPROFILE").unwrap_or_else(|_| "C:\\Users\\Default".into()))
    }

    #[cfg(not(target_os = "windows"))]
    {
        PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".into()))
    }
}

fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("squadrone").join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(target_os = "windows"))]
    {
        Ok(home_dir().join(".config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_loopback_and_notifications_on() {
        let config = TrackerConfig::default();
        assert!(config.stream_bind.is_loopback());
        assert_eq!(config.stream_port, DEFAULT_STREAM_PORT);
        assert!(config.notifications_enabled);
        assert!(config.journal_dir.ends_with("Elite Dangerous"));
    }

    #[test]
    fn partial_config_fills_missing_fields() {
        let config: TrackerConfig =
            serde_json::from_str(r#"{"stream_port": 9000}"#).unwrap();
        assert_eq!(config.stream_port, 9000);
        assert!(config.stream_bind.is_loopback());
        assert!(config.notifications_enabled);
    }

    #[test]
    fn config_roundtrip() {
        let config = TrackerConfig {
            journal_dir: PathBuf::from("/tmp/journals"),
            stream_bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            stream_port: 9100,
            notifications_enabled: false,
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: TrackerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
