use court_streams::RemoteApiError;
use court_streams::provision::{self, broadcast_request, ingest_request};
use court_streams::youtube_api::{LiveApi, YouTubeClient};
use oauth2::AccessToken;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> YouTubeClient {
    YouTubeClient::new(
        AccessToken::new("test-access-token".to_string()),
        format!("{}/youtube/v3/", server.uri()),
        reqwest::Client::new(),
    )
}

#[tokio::test]
async fn insert_broadcast_posts_policy_and_returns_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/youtube/v3/liveBroadcasts"))
        .and(query_param("part", "snippet,status,contentDetails"))
        .and(header("authorization", "Bearer test-access-token"))
        .and(body_partial_json(json!({
            "status": {"privacyStatus": "public", "selfDeclaredMadeForKids": false},
            "contentDetails": {"enableAutoStart": true, "latencyPreference": "low"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "youtube#liveBroadcast",
            "id": "broadcast-abc",
            "snippet": {
                "title": "Quadra 5 - sábado, 13 de janeiro de 2024",
                "scheduledStartTime": "2024-01-13T09:00:00Z"
            },
            "status": {"privacyStatus": "public", "lifeCycleStatus": "created"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let broadcast = provision::create_broadcast(
        &client(&server),
        "Quadra 5 - sábado, 13 de janeiro de 2024",
        "Stream ao vivo da quadra Quadra 5 do Campestre TV",
    )
    .await
    .unwrap();

    assert_eq!(broadcast.id, "broadcast-abc");
    assert_eq!(broadcast.watch_url(), "https://youtube.com/watch?v=broadcast-abc");
}

#[tokio::test]
async fn insert_stream_returns_ingestion_info() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/youtube/v3/liveStreams"))
        .and(query_param("part", "snippet,cdn,contentDetails"))
        .and(body_partial_json(json!({
            "cdn": {"ingestionType": "rtmp", "frameRate": "variable", "resolution": "variable"},
            "contentDetails": {"isReusable": false}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "stream-xyz",
            "snippet": {"title": "Stream - Quadra 5"},
            "cdn": {
                "ingestionType": "rtmp",
                "frameRate": "variable",
                "resolution": "variable",
                "ingestionInfo": {
                    "streamName": "abcd-efgh-ijkl-mnop",
                    "ingestionAddress": "rtmp://a.rtmp.youtube.com/live2",
                    "backupIngestionAddress": "rtmp://b.rtmp.youtube.com/live2?backup=1"
                }
            },
            "contentDetails": {"isReusable": false}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ingest = provision::create_ingest(&client(&server), "Quadra 5")
        .await
        .unwrap();

    assert_eq!(ingest.id, "stream-xyz");
    assert_eq!(
        ingest.publish_url().as_deref(),
        Some("rtmp://a.rtmp.youtube.com/live2/abcd-efgh-ijkl-mnop")
    );
    assert!(!ingest.reusable);
}

#[tokio::test]
async fn insert_stream_tolerates_missing_ingestion_info() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/youtube/v3/liveStreams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "stream-xyz",
            "cdn": {
                "ingestionType": "rtmp",
                "frameRate": "variable",
                "resolution": "variable",
                "ingestionInfo": {"streamName": "", "ingestionAddress": ""}
            }
        })))
        .mount(&server)
        .await;

    let ingest = provision::create_ingest(&client(&server), "Quadra 5")
        .await
        .unwrap();
    assert_eq!(ingest.ingest_address, None);
    assert_eq!(ingest.stream_key, None);
}

#[tokio::test]
async fn bind_sends_both_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/youtube/v3/liveBroadcasts/bind"))
        .and(query_param("part", "id,contentDetails"))
        .and(query_param("id", "broadcast-abc"))
        .and(query_param("streamId", "stream-xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "broadcast-abc",
            "contentDetails": {"boundStreamId": "stream-xyz"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let binding = provision::bind(&client(&server), "broadcast-abc", "stream-xyz")
        .await
        .unwrap();
    assert_eq!(binding.broadcast_id, "broadcast-abc");
    assert_eq!(binding.ingest_id, "stream-xyz");
}

#[tokio::test]
async fn rejection_carries_reason_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/youtube/v3/liveBroadcasts"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "The user is not enabled for live streaming.",
                "errors": [{
                    "message": "The user is not enabled for live streaming.",
                    "domain": "youtube.liveBroadcast",
                    "reason": "liveStreamingNotEnabled"
                }]
            }
        })))
        .mount(&server)
        .await;

    let request = broadcast_request("t", "d", jiff::Timestamp::now());
    let err = client(&server)
        .insert_live_broadcast(&request)
        .await
        .unwrap_err();

    match err {
        RemoteApiError::Rejected {
            operation,
            status,
            reason,
            message,
        } => {
            assert_eq!(operation, "liveBroadcasts.insert");
            assert_eq!(status, 403);
            assert_eq!(reason.as_deref(), Some("liveStreamingNotEnabled"));
            assert_eq!(message, "The user is not enabled for live streaming.");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn unstructured_error_body_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/youtube/v3/liveStreams"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway\n"))
        .mount(&server)
        .await;

    let err = client(&server)
        .insert_live_stream(&ingest_request("t"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "liveStreams.insert rejected with status 502: Bad Gateway"
    );
}

#[tokio::test]
async fn success_with_garbage_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/youtube/v3/liveBroadcasts/bind"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server)
        .bind_live_broadcast("b", "s")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RemoteApiError::Decode {
            operation: "liveBroadcasts.bind",
            ..
        }
    ));
}
