//! Error taxonomy for a provisioning run.
//!
//! [`Error::Config`] and [`Error::Auth`] are fatal and surface before any venue is touched.
//! [`Error::RemoteApi`] is caught per venue by the orchestrator. [`Error::Io`] is fatal for the
//! step that attempted the read or write.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required local configuration is missing or malformed.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// There is no way to obtain a usable access token.
    #[error("authorization error: {message}")]
    Auth {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    #[error(transparent)]
    RemoteApi(#[from] RemoteApiError),

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn auth_caused_by<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Auth {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// A call to the video platform did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum RemoteApiError {
    /// The platform answered with a non-success status.
    #[error("{operation} rejected with status {status}{}: {message}", fmt_reason(.reason))]
    Rejected {
        operation: &'static str,
        status: u16,
        /// Machine-readable reason from the platform's error body, e.g. `liveStreamingNotEnabled`.
        reason: Option<String>,
        message: String,
    },

    #[error("send {operation} request")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("parse {operation} response")]
    Decode {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

fn fmt_reason(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(" ({r})"))
        .unwrap_or_default()
}

impl RemoteApiError {
    /// Builds a [`RemoteApiError::Rejected`] from a failed response body.
    ///
    /// Google APIs answer errors with `{"error": {"code", "message", "errors": [{"reason"}]}}`;
    /// anything else is kept verbatim as the message.
    pub(crate) fn rejected(operation: &'static str, status: u16, body: &str) -> Self {
        #[derive(serde::Deserialize)]
        struct Envelope {
            error: Body,
        }
        #[derive(serde::Deserialize)]
        struct Body {
            message: String,
            #[serde(default)]
            errors: Vec<Item>,
        }
        #[derive(serde::Deserialize)]
        struct Item {
            reason: Option<String>,
        }

        match serde_json::from_str::<Envelope>(body) {
            Ok(Envelope { error }) => Self::Rejected {
                operation,
                status,
                reason: error.errors.into_iter().find_map(|e| e.reason),
                message: error.message,
            },
            Err(_) => Self::Rejected {
                operation,
                status,
                reason: None,
                message: if body.trim().is_empty() {
                    "unknown error".to_string()
                } else {
                    body.trim().to_string()
                },
            },
        }
    }
}
