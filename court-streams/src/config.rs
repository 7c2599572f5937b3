//! Run configuration: the venue list, output locations, and relay naming.
//!
//! Everything has a default matching the Campestre TV deployment, so the tool runs without a
//! config file. A YAML file can override any subset of the keys.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Base URL of the YouTube Data API v3.
pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// A physical court that gets one broadcast per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: u32,
    pub name: String,
}

impl Venue {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Locale used to render broadcast titles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Locale {
    #[default]
    #[serde(rename = "pt-BR")]
    #[value(name = "pt-BR")]
    PtBr,
    #[serde(rename = "en-US")]
    #[value(name = "en-US")]
    EnUs,
}

/// Where the tool reads its credentials from and writes its artifacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Paths {
    /// OAuth client configuration, only needed for interactive authorization.
    pub client_secrets: PathBuf,
    /// Persisted access/refresh token.
    pub token: PathBuf,
    /// Front-end manifest (`live.json`).
    pub manifest: PathBuf,
    /// go2rtc configuration.
    pub relay_config: PathBuf,
    /// Operator-only debug dump.
    pub details: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            client_secrets: PathBuf::from("client_secrets.json"),
            token: PathBuf::from("token.json"),
            manifest: PathBuf::from("live.json"),
            relay_config: PathBuf::from("go2rtc.yaml"),
            details: PathBuf::from("stream_details.json"),
        }
    }
}

/// Naming rules for the relay configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelaySettings {
    /// Environment variable prefix holding each court's camera URL, e.g. `QUADRA5`.
    pub source_env_prefix: String,
    /// Prefix of the go2rtc stream name, e.g. `quadra5`.
    pub stream_key_prefix: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            source_env_prefix: "QUADRA".to_string(),
            stream_key_prefix: "quadra".to_string(),
        }
    }
}

impl RelaySettings {
    pub fn env_var_for(&self, venue: &Venue) -> String {
        format!("{}{}", self.source_env_prefix, venue.id)
    }

    pub fn stream_key_for(&self, venue_id: u32) -> String {
        format!("{}{}", self.stream_key_prefix, venue_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub venues: Vec<Venue>,
    pub locale: Locale,
    /// Broadcast description; `{venue}` is replaced by the venue name.
    pub description: String,
    pub api_base: String,
    pub paths: Paths,
    pub relay: RelaySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            venues: vec![
                Venue::new(5, "Quadra 5"),
                Venue::new(6, "Quadra 6"),
                Venue::new(8, "Quadra 8"),
            ],
            locale: Locale::default(),
            description: "Stream ao vivo da quadra {venue} do Campestre TV".to_string(),
            api_base: YOUTUBE_API_BASE.to_string(),
            paths: Paths::default(),
            relay: RelaySettings::default(),
        }
    }
}

impl Config {
    /// Reads and validates a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        let config: Self = serde_yaml::from_str(&raw).map_err(|e| {
            Error::config(format!("malformed config file {}: {e}", path.display()))
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), venues = config.venues.len(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.venues.is_empty() {
            return Err(Error::config("no venues configured"));
        }
        let mut seen = HashSet::new();
        for venue in &self.venues {
            if !seen.insert(venue.id) {
                return Err(Error::config(format!("duplicate venue id {}", venue.id)));
            }
        }
        Ok(())
    }
}
