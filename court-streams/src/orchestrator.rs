//! Runs title → broadcast → ingest → bind for every venue, in order.
//!
//! A venue that fails at any step is logged, recorded as a [`VenueFailure`], and skipped; the
//! remaining venues are still processed. Nothing is retried and nothing is rolled back: a
//! broadcast or ingest endpoint created before the failing step stays on the platform, and its
//! id is kept in the failure so an operator can remove it by hand.

use crate::config::{Config, Locale, Venue};
use crate::error::RemoteApiError;
use crate::provision::{self, Broadcast, IngestEndpoint};
use crate::title::title_for_locale;
use crate::youtube_api::LiveApi;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::Instrument;

/// What a run needs besides the venues and the API.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Date that goes into the titles.
    pub date: Date,
    pub locale: Locale,
    /// Broadcast description; `{venue}` is replaced by the venue name.
    pub description: String,
}

impl RunSettings {
    /// Settings for a run on `date` under `config`.
    pub fn new(config: &Config, date: Date) -> Self {
        Self {
            date,
            locale: config.locale,
            description: config.description.clone(),
        }
    }

    fn description_for(&self, venue: &Venue) -> String {
        self.description.replace("{venue}", &venue.name)
    }
}

/// Everything provisioned for one venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueStreamResult {
    pub venue_id: u32,
    pub venue_name: String,
    pub title: String,
    pub broadcast_id: String,
    pub stream_id: String,
    /// Same as `broadcast_id`: the broadcast is the video.
    pub video_id: String,
    pub ingest_url: Option<String>,
    pub stream_key: Option<String>,
    pub watch_url: String,
}

impl VenueStreamResult {
    fn new(venue: &Venue, title: String, broadcast: Broadcast, ingest: IngestEndpoint) -> Self {
        Self {
            venue_id: venue.id,
            venue_name: venue.name.clone(),
            title,
            watch_url: broadcast.watch_url(),
            video_id: broadcast.id.clone(),
            broadcast_id: broadcast.id,
            stream_id: ingest.id,
            ingest_url: ingest.ingest_address,
            stream_key: ingest.stream_key,
        }
    }

    /// `{ingest_url}/{stream_key}`, if both are provisioned.
    pub fn publish_url(&self) -> Option<String> {
        match (&self.ingest_url, &self.stream_key) {
            (Some(address), Some(key)) => Some(format!("{address}/{key}")),
            _ => None,
        }
    }
}

/// The step at which a venue failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateBroadcast,
    CreateIngest,
    Bind,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateBroadcast => write!(f, "create broadcast"),
            Self::CreateIngest => write!(f, "create ingest stream"),
            Self::Bind => write!(f, "bind broadcast to stream"),
        }
    }
}

/// A venue that did not make it, and what it left behind.
#[derive(Debug)]
pub struct VenueFailure {
    pub venue: Venue,
    pub step: Step,
    pub error: RemoteApiError,
    /// Broadcast created before the failure, now without a purpose.
    pub orphaned_broadcast: Option<String>,
    /// Ingest endpoint created before the failure, now without a purpose.
    pub orphaned_ingest: Option<String>,
}

/// Results of a run, both in venue order.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub results: Vec<VenueStreamResult>,
    pub failures: Vec<VenueFailure>,
}

impl RunOutcome {
    pub fn attempted(&self) -> usize {
        self.results.len() + self.failures.len()
    }
}

/// Provisions every venue in order and collects the successes.
pub async fn run<A: LiveApi>(api: &A, venues: &[Venue], settings: &RunSettings) -> RunOutcome {
    let mut outcome = RunOutcome::default();
    for venue in venues {
        let span = tracing::info_span!("venue", venue_id = venue.id, venue = %venue.name);
        match provision_venue(api, venue, settings).instrument(span).await {
            Ok(result) => outcome.results.push(result),
            Err(failure) => {
                println!(
                    "✗ Error creating stream for {}: {}",
                    failure.venue.name, failure.error
                );
                tracing::error!(
                    venue_id = failure.venue.id,
                    venue = %failure.venue.name,
                    step = %failure.step,
                    orphaned_broadcast = failure.orphaned_broadcast.as_deref(),
                    orphaned_ingest = failure.orphaned_ingest.as_deref(),
                    "venue provisioning failed: {}",
                    failure.error
                );
                outcome.failures.push(failure);
            }
        }
    }
    outcome
}

async fn provision_venue<A: LiveApi>(
    api: &A,
    venue: &Venue,
    settings: &RunSettings,
) -> Result<VenueStreamResult, VenueFailure> {
    let fail = |step, error, broadcast: Option<&str>, ingest: Option<&str>| VenueFailure {
        venue: venue.clone(),
        step,
        error,
        orphaned_broadcast: broadcast.map(str::to_string),
        orphaned_ingest: ingest.map(str::to_string),
    };

    let title = title_for_locale(&venue.name, settings.date, settings.locale);
    println!("\n{}", "=".repeat(50));
    println!("Setting up stream: {title}");
    println!("{}", "=".repeat(50));

    let broadcast = provision::create_broadcast(api, &title, &settings.description_for(venue))
        .await
        .map_err(|e| fail(Step::CreateBroadcast, e, None, None))?;
    println!("✓ Created broadcast: {title}");
    println!("  Broadcast ID: {}", broadcast.id);

    let ingest = provision::create_ingest(api, &title)
        .await
        .map_err(|e| fail(Step::CreateIngest, e, Some(broadcast.id.as_str()), None))?;
    println!("✓ Created stream for: {title}");
    println!("  Stream ID: {}", ingest.id);
    println!(
        "  Ingest URL: {}",
        ingest.ingest_address.as_deref().unwrap_or("N/A")
    );

    provision::bind(api, &broadcast.id, &ingest.id)
        .await
        .map_err(|e| fail(Step::Bind, e, Some(broadcast.id.as_str()), Some(ingest.id.as_str())))?;
    println!("✓ Bound broadcast {} to stream {}", broadcast.id, ingest.id);

    tracing::info!(broadcast_id = %broadcast.id, stream_id = %ingest.id, "venue provisioned");
    Ok(VenueStreamResult::new(venue, title, broadcast, ingest))
}
