//! YouTube Data API v3 client, reduced to what provisioning a live event needs.
//!
//! # Broadcasts vs Streams
//!
//! ## [`broadcasts::LiveBroadcast`] - Viewer-Facing Events
//! - Title, description, scheduled time, privacy
//! - Each broadcast is exactly one YouTube video; its id is the video id
//!
//! ## [`streams::LiveStream`] - Ingestion
//! - Encoder settings and the ingestion address + stream key
//! - Media pushed to the stream shows up in whichever broadcast it is bound to
//!
//! ## Workflow
//! 1. Create a [`broadcasts::LiveBroadcast`] for the event
//! 2. Create a [`streams::LiveStream`] for the camera
//! 3. Bind the broadcast to the stream
//!
//! With auto-start and auto-stop enabled the broadcast then goes live as soon as media arrives
//! on the stream and completes when it stops.

pub mod broadcasts;
pub mod client;
pub mod streams;

pub use client::{LiveApi, YouTubeClient};

pub use broadcasts::{
    BroadcastPrivacyStatus, LatencyPreference, LiveBroadcast, LiveBroadcastContentDetails,
    LiveBroadcastInsertRequest, LiveBroadcastSnippet, LiveBroadcastStatus,
};

pub use streams::{
    FrameRate, IngestionInfo, IngestionType, LiveStream, LiveStreamCdn, LiveStreamContentDetails,
    LiveStreamInsertRequest, LiveStreamSnippet, Resolution,
};
