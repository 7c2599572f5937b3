//! Files a run leaves behind for other programs.
//!
//! - the manifest the web front-end reads to embed each court's video
//! - the go2rtc configuration that relays each camera to its ingest endpoint
//! - a details dump for the operator
//!
//! Each file is rewritten from scratch on every run, including runs where no venue succeeded.

use crate::config::{Paths, RelaySettings, Venue};
use crate::error::Error;
use crate::orchestrator::VenueStreamResult;
use indexmap::IndexMap;
use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One entry of the front-end manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: u32,
    /// Venue display name.
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "videoId")]
    pub video_id: String,
}

impl From<&VenueStreamResult> for ManifestEntry {
    fn from(result: &VenueStreamResult) -> Self {
        Self {
            id: result.venue_id,
            title: result.venue_name.clone(),
            kind: "youtube".to_string(),
            video_id: result.video_id.clone(),
        }
    }
}

/// go2rtc configuration: camera in, ingest endpoint out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    pub streams: IndexMap<String, String>,
    pub publish: IndexMap<String, String>,
    pub log: RelayLog,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayLog {
    pub output: String,
    pub level: String,
    pub format: String,
}

impl Default for RelayLog {
    fn default() -> Self {
        Self {
            output: "file".to_string(),
            level: "trace".to_string(),
            format: "json".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Details<'a> {
    generated_at: DateTime,
    streams: &'a [VenueStreamResult],
}

/// Inbound camera address of each venue, keyed by venue id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelaySources(HashMap<u32, String>);

impl RelaySources {
    /// Reads `{source_env_prefix}{venue_id}` for every venue.
    ///
    /// Variables that are unset or not unicode are left out.
    pub fn from_env(relay: &RelaySettings, venues: &[Venue]) -> Self {
        venues
            .iter()
            .filter_map(|venue| {
                let var = relay.env_var_for(venue);
                match std::env::var(&var) {
                    Ok(source) => Some((venue.id, source)),
                    Err(e) => {
                        tracing::debug!(venue_id = venue.id, var = %var, "no relay source: {e}");
                        None
                    }
                }
            })
            .collect()
    }

    pub fn insert(&mut self, venue_id: u32, source: impl Into<String>) {
        self.0.insert(venue_id, source.into());
    }

    pub fn get(&self, venue_id: u32) -> Option<&str> {
        self.0.get(&venue_id).map(String::as_str)
    }
}

impl FromIterator<(u32, String)> for RelaySources {
    fn from_iter<T: IntoIterator<Item = (u32, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Why a provisioned venue is missing from the relay configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelaySkip {
    /// The camera address variable is not set.
    MissingSource { venue_id: u32, env_var: String },
    /// The platform did not hand out an ingest address and key.
    NotProvisioned { venue_id: u32 },
}

impl std::fmt::Display for RelaySkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSource { venue_id, env_var } => {
                write!(f, "venue {venue_id}: {env_var} is not set")
            }
            Self::NotProvisioned { venue_id } => {
                write!(f, "venue {venue_id}: ingest address or stream key not provisioned")
            }
        }
    }
}

/// Builds the manifest entries, in result order.
pub fn manifest(results: &[VenueStreamResult]) -> Vec<ManifestEntry> {
    results.iter().map(ManifestEntry::from).collect()
}

/// Builds the relay configuration, in result order.
///
/// Venues without a camera source or without a publish URL are left out of both sections and
/// returned as skips.
pub fn relay_config(
    results: &[VenueStreamResult],
    sources: &RelaySources,
    relay: &RelaySettings,
) -> (RelayConfig, Vec<RelaySkip>) {
    let mut config = RelayConfig {
        streams: IndexMap::new(),
        publish: IndexMap::new(),
        log: RelayLog::default(),
    };
    let mut skipped = Vec::new();

    for result in results {
        let venue_id = result.venue_id;
        let Some(source) = sources.get(venue_id) else {
            skipped.push(RelaySkip::MissingSource {
                venue_id,
                env_var: format!("{}{venue_id}", relay.source_env_prefix),
            });
            continue;
        };
        let Some(publish) = result.publish_url() else {
            skipped.push(RelaySkip::NotProvisioned { venue_id });
            continue;
        };
        let key = relay.stream_key_for(venue_id);
        config.streams.insert(key.clone(), source.to_string());
        config.publish.insert(key, publish);
    }

    (config, skipped)
}

/// What [`ArtifactWriter::write`] did besides writing.
#[derive(Debug, Default)]
pub struct WriteReport {
    pub relay_skipped: Vec<RelaySkip>,
}

/// Writes the manifest, relay configuration, and details files.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    paths: Paths,
    relay: RelaySettings,
}

impl ArtifactWriter {
    pub fn new(paths: Paths, relay: RelaySettings) -> Self {
        Self { paths, relay }
    }

    /// Overwrites all three files.
    ///
    /// The writes do not depend on each other, so each one is attempted even when an earlier
    /// one failed. Every failure is logged; the first is returned.
    pub async fn write(
        &self,
        results: &[VenueStreamResult],
        sources: &RelaySources,
    ) -> Result<WriteReport, Error> {
        let generated_at = jiff::Zoned::now().datetime();
        let (relay_config, relay_skipped) = relay_config(results, sources, &self.relay);
        for skip in &relay_skipped {
            println!("✗ Relay not configured for {skip}");
            tracing::warn!("left out of relay configuration: {skip}");
        }

        let attempts = [
            (
                "manifest",
                write_json(&self.paths.manifest, &manifest(results)).await,
            ),
            (
                "relay configuration",
                write_yaml(&self.paths.relay_config, &relay_config).await,
            ),
            (
                "stream details",
                write_json(
                    &self.paths.details,
                    &Details {
                        generated_at,
                        streams: results,
                    },
                )
                .await,
            ),
        ];

        let mut first_error = None;
        for (what, attempt) in attempts {
            match attempt {
                Ok(path) => println!("✓ Saved {what} to: {}", path.display()),
                Err(e) => {
                    tracing::error!("cannot save {what}: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(WriteReport { relay_skipped }),
        }
    }
}

async fn write_json<'p, T: Serialize>(path: &'p Path, value: &T) -> Result<&'p Path, Error> {
    let mut json = serde_json::to_vec_pretty(value).map_err(|e| Error::io(path, e.into()))?;
    json.push(b'\n');
    write_file(path, json).await
}

async fn write_yaml<'p, T: Serialize>(path: &'p Path, value: &T) -> Result<&'p Path, Error> {
    let yaml = serde_yaml::to_string(value).map_err(|e| Error::io(path, std::io::Error::other(e)))?;
    write_file(path, yaml.into_bytes()).await
}

async fn write_file(path: &Path, contents: Vec<u8>) -> Result<&Path, Error> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| Error::io(path, e))?;
    tracing::debug!(path = %path.display(), "wrote artifact");
    Ok(path)
}
