//! Wire types for `liveBroadcasts.insert` and `liveBroadcasts.bind`.
//!
//! A broadcast is the viewer-facing event: title, description, schedule, privacy. Each
//! broadcast is exactly one YouTube video, so its id is also the video id viewers watch.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request body for `liveBroadcasts.insert` with `part=snippet,status,contentDetails`.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts/insert>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastInsertRequest {
    pub snippet: LiveBroadcastSnippet,
    pub status: LiveBroadcastStatus,
    pub content_details: LiveBroadcastContentDetails,
}

/// A `liveBroadcast` resource as returned by the API.
///
/// Which parts are present depends on the `part` parameter of the request, so everything but the
/// id is optional.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#resource>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcast {
    /// The ID that YouTube assigns to uniquely identify the broadcast.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<LiveBroadcastSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LiveBroadcastStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_details: Option<LiveBroadcastContentDetails>,
}

/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#snippet>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastSnippet {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the broadcast is scheduled to start. Required on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_start_time: Option<Timestamp>,
}

/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#status>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastStatus {
    pub privacy_status: BroadcastPrivacyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_declared_made_for_kids: Option<bool>,
    /// Only present in responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_cycle_status: Option<String>,
}

/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#contentDetails>
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastContentDetails {
    /// The stream this broadcast is bound to. Only present in responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_stream_id: Option<String>,
    /// Go live as soon as the bound stream starts receiving media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_auto_start: Option<bool>,
    /// Complete the broadcast once the bound stream stops receiving media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_auto_stop: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_preference: Option<LatencyPreference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_dvr: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_embed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_from_start: Option<bool>,
}

/// The broadcast's privacy status.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#status.privacyStatus>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BroadcastPrivacyStatus {
    /// The broadcast is public and can be viewed by anyone.
    Public,
    /// The broadcast is unlisted and can only be viewed by people with the link.
    Unlisted,
    /// The broadcast is private and can only be viewed by the owner and authorized viewers.
    Private,
}

impl fmt::Display for BroadcastPrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Unlisted => write!(f, "unlisted"),
            Self::Private => write!(f, "private"),
        }
    }
}

/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#contentDetails.latencyPreference>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LatencyPreference {
    Normal,
    Low,
    UltraLow,
}
