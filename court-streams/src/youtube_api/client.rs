//! Authenticated access to the YouTube Data API v3.

use crate::error::RemoteApiError;
use crate::youtube_api::broadcasts::{LiveBroadcast, LiveBroadcastInsertRequest};
use crate::youtube_api::streams::{LiveStream, LiveStreamInsertRequest};
use http::Method;
use oauth2::AccessToken;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

/// The three platform operations a provisioning run needs.
///
/// [`YouTubeClient`] is the real implementation; tests provide in-memory fakes.
#[allow(async_fn_in_trait)]
pub trait LiveApi {
    /// `liveBroadcasts.insert`
    async fn insert_live_broadcast(
        &self,
        request: &LiveBroadcastInsertRequest,
    ) -> Result<LiveBroadcast, RemoteApiError>;

    /// `liveStreams.insert`
    async fn insert_live_stream(
        &self,
        request: &LiveStreamInsertRequest,
    ) -> Result<LiveStream, RemoteApiError>;

    /// `liveBroadcasts.bind`
    async fn bind_live_broadcast(
        &self,
        broadcast_id: &str,
        stream_id: &str,
    ) -> Result<LiveBroadcast, RemoteApiError>;
}

/// Client for the YouTube Data API v3, holding a ready-to-use access token.
///
/// Instances are handed out by [`crate::credentials::CredentialManager::obtain_client`], which
/// guarantees the token is fresh for at least the safety window. The client never sees the
/// refresh token.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    access_token: AccessToken,
    api_base: String,
    client: reqwest::Client,
}

impl YouTubeClient {
    /// Creates a client against `api_base` (normally [`crate::config::YOUTUBE_API_BASE`]).
    pub fn new(access_token: AccessToken, api_base: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            access_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Makes an authenticated request and decodes a JSON response.
    ///
    /// Non-success statuses become [`RemoteApiError::Rejected`] carrying the platform's error
    /// reason and message.
    #[instrument(skip(self, json_body), level = "trace")]
    async fn request_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        query_params: &[(&str, &str)],
        json_body: Option<&(impl Serialize + Sync)>,
    ) -> Result<T, RemoteApiError> {
        let url = format!("{}/{}", self.api_base, path);
        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(self.access_token.secret())
            .query(query_params);

        if let Some(body) = json_body {
            request = request.json(body);
        } else {
            // bind is a POST without a body, and Google insists on a length
            request = request.header(http::header::CONTENT_LENGTH, 0);
        }

        let response = request
            .send()
            .await
            .map_err(|source| RemoteApiError::Transport { operation, source })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RemoteApiError::rejected(operation, status.as_u16(), &error_text));
        }

        response
            .json()
            .await
            .map_err(|source| RemoteApiError::Decode { operation, source })
    }
}

impl LiveApi for YouTubeClient {
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts/insert>
    #[instrument(skip_all, fields(title = %request.snippet.title))]
    async fn insert_live_broadcast(
        &self,
        request: &LiveBroadcastInsertRequest,
    ) -> Result<LiveBroadcast, RemoteApiError> {
        let broadcast: LiveBroadcast = self
            .request_json(
                "liveBroadcasts.insert",
                Method::POST,
                "liveBroadcasts",
                &[("part", "snippet,status,contentDetails")],
                Some(request),
            )
            .await?;

        tracing::debug!(broadcast_id = %broadcast.id, "created broadcast");
        Ok(broadcast)
    }

    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/live/docs/liveStreams/insert>
    #[instrument(skip_all, fields(title = %request.snippet.title))]
    async fn insert_live_stream(
        &self,
        request: &LiveStreamInsertRequest,
    ) -> Result<LiveStream, RemoteApiError> {
        let stream: LiveStream = self
            .request_json(
                "liveStreams.insert",
                Method::POST,
                "liveStreams",
                &[("part", "snippet,cdn,contentDetails")],
                Some(request),
            )
            .await?;

        tracing::debug!(stream_id = %stream.id, "created stream");
        Ok(stream)
    }

    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts/bind>
    #[instrument(skip(self))]
    async fn bind_live_broadcast(
        &self,
        broadcast_id: &str,
        stream_id: &str,
    ) -> Result<LiveBroadcast, RemoteApiError> {
        let broadcast: LiveBroadcast = self
            .request_json(
                "liveBroadcasts.bind",
                Method::POST,
                "liveBroadcasts/bind",
                &[
                    ("part", "id,contentDetails"),
                    ("id", broadcast_id),
                    ("streamId", stream_id),
                ],
                None::<&()>,
            )
            .await?;

        tracing::debug!(broadcast_id, stream_id, "bound broadcast to stream");
        Ok(broadcast)
    }
}
