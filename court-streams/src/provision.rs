//! Creating and binding the remote resources for one venue.
//!
//! Every broadcast is created public, made-not-for-kids, low latency, with auto-start and
//! auto-stop, so it goes live on the first media that reaches its ingest endpoint and ends when
//! the camera stops. Every ingest endpoint is single-use with variable resolution and frame
//! rate, which accepts whatever the court camera sends.
//!
//! None of these retry. Errors go back to the caller untouched.

use crate::error::RemoteApiError;
use crate::youtube_api::{
    BroadcastPrivacyStatus, FrameRate, IngestionType, LatencyPreference, LiveApi,
    LiveBroadcastContentDetails, LiveBroadcastInsertRequest, LiveBroadcastSnippet,
    LiveBroadcastStatus, LiveStreamCdn, LiveStreamContentDetails, LiveStreamInsertRequest,
    LiveStreamSnippet, Resolution,
};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A scheduled public event on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Broadcast {
    /// Platform-assigned id, which is also the video id viewers watch.
    pub id: String,
    pub title: String,
    pub description: String,
    pub privacy: BroadcastPrivacyStatus,
    pub auto_start: bool,
    pub auto_stop: bool,
    pub latency: LatencyPreference,
}

impl Broadcast {
    pub fn watch_url(&self) -> String {
        watch_url(&self.id)
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://youtube.com/watch?v={video_id}")
}

/// A single-use ingestion target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestEndpoint {
    pub id: String,
    /// `None` while the platform has not provisioned it yet.
    pub ingest_address: Option<String>,
    /// The stream key. `None` while the platform has not provisioned it yet.
    pub stream_key: Option<String>,
    pub reusable: bool,
}

impl IngestEndpoint {
    /// `{ingest_address}/{stream_key}`, the URL an encoder publishes to.
    ///
    /// `None` until both halves are provisioned.
    pub fn publish_url(&self) -> Option<String> {
        match (&self.ingest_address, &self.stream_key) {
            (Some(address), Some(key)) => Some(format!("{address}/{key}")),
            _ => None,
        }
    }
}

/// Outcome of a successful bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingResult {
    pub broadcast_id: String,
    pub ingest_id: String,
}

/// The `liveBroadcasts.insert` body for a broadcast starting at `now`.
pub fn broadcast_request(title: &str, description: &str, now: Timestamp) -> LiveBroadcastInsertRequest {
    LiveBroadcastInsertRequest {
        snippet: LiveBroadcastSnippet {
            title: title.to_string(),
            description: Some(description.to_string()),
            // the broadcast activates on first ingested media, not at a set time
            scheduled_start_time: Some(now),
        },
        status: LiveBroadcastStatus {
            privacy_status: BroadcastPrivacyStatus::Public,
            self_declared_made_for_kids: Some(false),
            life_cycle_status: None,
        },
        content_details: LiveBroadcastContentDetails {
            bound_stream_id: None,
            enable_auto_start: Some(true),
            enable_auto_stop: Some(true),
            latency_preference: Some(LatencyPreference::Low),
            enable_dvr: Some(true),
            enable_embed: Some(true),
            record_from_start: Some(true),
        },
    }
}

/// Creates the public broadcast for a venue.
pub async fn create_broadcast<A: LiveApi>(
    api: &A,
    title: &str,
    description: &str,
) -> Result<Broadcast, RemoteApiError> {
    let request = broadcast_request(title, description, Timestamp::now());
    let created = api.insert_live_broadcast(&request).await?;

    Ok(Broadcast {
        id: created.id,
        title: request.snippet.title,
        description: description.to_string(),
        privacy: request.status.privacy_status,
        auto_start: true,
        auto_stop: true,
        latency: LatencyPreference::Low,
    })
}

/// The `liveStreams.insert` body for the ingest endpoint of the broadcast titled `title`.
pub fn ingest_request(title: &str) -> LiveStreamInsertRequest {
    LiveStreamInsertRequest {
        snippet: LiveStreamSnippet {
            title: format!("Stream - {title}"),
            description: Some(format!("Ingest stream for {title}")),
        },
        cdn: LiveStreamCdn {
            ingestion_type: IngestionType::Rtmp,
            frame_rate: FrameRate::Variable,
            resolution: Resolution::Variable,
            ingestion_info: None,
        },
        content_details: LiveStreamContentDetails { is_reusable: false },
    }
}

/// Creates the single-use ingest endpoint for a venue.
///
/// A response without address or key still counts as created.
pub async fn create_ingest<A: LiveApi>(api: &A, title: &str) -> Result<IngestEndpoint, RemoteApiError> {
    let created = api.insert_live_stream(&ingest_request(title)).await?;

    let info = created.ingestion_info().cloned().unwrap_or_default();
    let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());
    let endpoint = IngestEndpoint {
        ingest_address: non_empty(info.ingestion_address),
        stream_key: non_empty(info.stream_name),
        reusable: created
            .content_details
            .as_ref()
            .is_some_and(|details| details.is_reusable),
        id: created.id,
    };
    if endpoint.publish_url().is_none() {
        tracing::warn!(
            stream_id = %endpoint.id,
            "platform has not provisioned ingestion address and key yet"
        );
    }
    Ok(endpoint)
}

/// Binds a broadcast to an ingest endpoint.
///
/// Success means the platform accepted the request; the binding is not read back.
pub async fn bind<A: LiveApi>(
    api: &A,
    broadcast_id: &str,
    ingest_id: &str,
) -> Result<BindingResult, RemoteApiError> {
    api.bind_live_broadcast(broadcast_id, ingest_id).await?;
    Ok(BindingResult {
        broadcast_id: broadcast_id.to_string(),
        ingest_id: ingest_id.to_string(),
    })
}
