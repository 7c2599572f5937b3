//! Provisions one public YouTube live broadcast per court, binds each to a fresh ingest
//! endpoint, and writes the files the web front-end and the go2rtc relay consume.
//!
//! The flow of a run:
//! 1. [`credentials::CredentialManager`] produces an authenticated [`youtube_api::YouTubeClient`]
//! 2. [`orchestrator::run`] creates broadcast, ingest stream and binding for each venue
//! 3. [`artifacts::ArtifactWriter`] writes the manifest, relay configuration and details
//! 4. [`summary::render`] reports the outcome

pub mod artifacts;
pub mod config;
pub mod credentials;
pub mod error;
pub mod oauth;
pub mod orchestrator;
pub mod provision;
pub mod summary;
pub mod title;
pub mod youtube_api;

pub use config::{Config, Locale, Venue};
pub use error::{Error, RemoteApiError};
pub use title::title_for;
