//! Wire types for `liveStreams.insert`.
//!
//! A stream is the technical side of a live event: where the encoder pushes media and with
//! which key. Streams are bound to broadcasts; this tool creates a fresh, non-reusable one for
//! every broadcast.

use serde::{Deserialize, Serialize};

/// Request body for `liveStreams.insert` with `part=snippet,cdn,contentDetails`.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams/insert>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamInsertRequest {
    pub snippet: LiveStreamSnippet,
    pub cdn: LiveStreamCdn,
    pub content_details: LiveStreamContentDetails,
}

/// A `liveStream` resource as returned by the API.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#resource>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStream {
    /// The ID that YouTube assigns to uniquely identify the stream.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<LiveStreamSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn: Option<LiveStreamCdn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_details: Option<LiveStreamContentDetails>,
}

impl LiveStream {
    pub fn ingestion_info(&self) -> Option<&IngestionInfo> {
        self.cdn.as_ref()?.ingestion_info.as_ref()
    }
}

/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#snippet>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStreamSnippet {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Encoder-facing settings of a stream.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#cdn>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamCdn {
    pub ingestion_type: IngestionType,
    pub frame_rate: FrameRate,
    pub resolution: Resolution,
    /// Assigned by YouTube. Only present in responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingestion_info: Option<IngestionInfo>,
}

/// Where and with which key the encoder should push media.
///
/// YouTube may omit either field while it is still provisioning the stream.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#cdn.ingestionInfo>
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionInfo {
    /// The stream key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingestion_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_ingestion_address: Option<String>,
}

/// See: <https://developers.google.com/youtube/v3/live/docs/liveStreams#contentDetails>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamContentDetails {
    /// Whether the stream can be bound to more than one broadcast over its lifetime.
    pub is_reusable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IngestionType {
    Rtmp,
    Dash,
    Webrtc,
    Hls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameRate {
    #[serde(rename = "30fps")]
    Fps30,
    #[serde(rename = "60fps")]
    Fps60,
    #[serde(rename = "variable")]
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "240p")]
    R240p,
    #[serde(rename = "360p")]
    R360p,
    #[serde(rename = "480p")]
    R480p,
    #[serde(rename = "720p")]
    R720p,
    #[serde(rename = "1080p")]
    R1080p,
    #[serde(rename = "1440p")]
    R1440p,
    #[serde(rename = "2160p")]
    R2160p,
    #[serde(rename = "variable")]
    Variable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn insert_response_exposes_ingestion_info() {
        let stream: LiveStream = serde_json::from_value(json!({
            "kind": "youtube#liveStream",
            "id": "stream-1",
            "snippet": {"title": "Stream - Quadra 5", "publishedAt": "2024-01-13T09:00:00Z"},
            "cdn": {
                "ingestionType": "rtmp",
                "frameRate": "variable",
                "resolution": "variable",
                "ingestionInfo": {
                    "streamName": "abcd-efgh-ijkl",
                    "ingestionAddress": "rtmp://a.rtmp.youtube.com/live2",
                    "backupIngestionAddress": "rtmp://b.rtmp.youtube.com/live2?backup=1"
                }
            },
            "contentDetails": {"isReusable": false, "closedCaptionsIngestionUrl": "http://x"}
        }))
        .unwrap();

        let info = stream.ingestion_info().unwrap();
        assert_eq!(info.stream_name.as_deref(), Some("abcd-efgh-ijkl"));
        assert_eq!(
            info.ingestion_address.as_deref(),
            Some("rtmp://a.rtmp.youtube.com/live2")
        );
    }

    #[test]
    fn missing_cdn_means_no_ingestion_info() {
        let stream: LiveStream = serde_json::from_value(json!({"id": "stream-2"})).unwrap();
        assert_eq!(stream.ingestion_info(), None);
    }
}
