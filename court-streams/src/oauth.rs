//! OAuth 2.0 for installed applications against Google's authorization server.
//!
//! Two exchanges are supported: the interactive authorization-code flow with PKCE, which sends
//! the operator to a browser and receives the code on a loopback redirect server, and the
//! non-interactive refresh-token exchange.

use crate::error::Error;
use eyre::Context;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use oauth2::basic::{BasicClient, BasicErrorResponseType, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    RedirectUrl, RefreshToken, Scope, TokenUrl,
};
use oauth2::{RequestTokenError, reqwest};
use serde::Deserialize;
use std::future::Future;
use std::path::Path;

/// Scope needed to create and bind live broadcasts.
pub const YOUTUBE_SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";

/// Google's token endpoint, used when a client secrets file does not name one.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

const OAUTH_DONE: &str = include_str!("../oauth_success.html");

/// OAuth client configuration as downloaded from the Google Cloud console.
///
/// The file wraps the fields in an `installed` (desktop app) or `web` object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl ClientSecrets {
    /// Loads a `client_secrets.json` file.
    ///
    /// A missing or malformed file is a configuration error: without it there is no way to
    /// start an authorization flow.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        #[derive(Deserialize)]
        struct File {
            #[serde(alias = "web")]
            installed: ClientSecrets,
        }

        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "client secrets file {} not readable ({e}); download it from \
                 Google Cloud Console > APIs & Services > Credentials",
                path.display()
            ))
        })?;
        let file: File = serde_json::from_str(&raw).map_err(|e| {
            Error::config(format!(
                "client secrets file {} is malformed: {e}",
                path.display()
            ))
        })?;
        Ok(file.installed)
    }
}

/// An HTTP client for talking to the token endpoint.
fn token_http_client() -> Result<reqwest::Client, Error> {
    reqwest::ClientBuilder::new()
        // SSRF no thank you.
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| Error::auth_caused_by("build HTTP client for token endpoint", e))
}

fn token_url(token_uri: &str) -> Result<TokenUrl, Error> {
    TokenUrl::new(token_uri.to_string())
        .map_err(|e| Error::config(format!("invalid token endpoint {token_uri}: {e}")))
}

/// Runs the interactive authorization flow for `secrets`.
///
/// 1. Starts a loopback HTTP server to receive the redirect
/// 2. Opens the operator's browser on the consent page (the URL is also printed)
/// 3. Exchanges the returned code for a token
///
/// Blocks until the operator completes or rejects the consent screen.
pub async fn authorize(secrets: &ClientSecrets) -> Result<BasicTokenResponse, Error> {
    let csrf = CsrfToken::new_random();
    let (redirect_url, eventually_authorization_code) = setup_redirect(csrf.clone())
        .await
        .map_err(|e| Error::auth(format!("set up redirect endpoint: {e:#}")))?;

    let auth_url = AuthUrl::new(secrets.auth_uri.clone()).map_err(|e| {
        Error::config(format!(
            "invalid authorization endpoint {}: {e}",
            secrets.auth_uri
        ))
    })?;
    let client = BasicClient::new(ClientId::new(secrets.client_id.clone()))
        .set_client_secret(ClientSecret::new(secrets.client_secret.clone()))
        .set_auth_uri(auth_url)
        .set_token_uri(token_url(&secrets.token_uri)?)
        .set_redirect_uri(redirect_url);

    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
    let (auth_url, _csrf_token) = client
        // We never re-use the CSRF since we only go through the flow exactly once.
        .authorize_url(move || csrf.clone())
        .add_scope(Scope::new(YOUTUBE_SCOPE.to_string()))
        // offline + consent, or Google won't hand out a refresh token
        .add_extra_param("access_type", "offline")
        .add_extra_param("prompt", "consent")
        .set_pkce_challenge(pkce_challenge)
        .url();

    tracing::info!(url = %auth_url, "asking operator to follow OAuth flow");
    println!("Open this URL to authorize access to YouTube:\n\n    {auth_url}\n");
    if let Err(e) = webbrowser::open(auth_url.as_ref()) {
        tracing::warn!("could not open a browser, open the URL manually: {e}");
    }

    let authorization_code = eventually_authorization_code
        .await
        .map_err(|e| Error::auth(format!("await operator authorization: {e:#}")))?;

    let http_client = token_http_client()?;
    let token = client
        .exchange_code(authorization_code)
        .set_pkce_verifier(pkce_verifier)
        .request_async(&http_client)
        .await
        .map_err(|e| Error::auth_caused_by("exchange authorization code for access token", e))?;

    tracing::info!("operator authorized access");
    Ok(token)
}

/// Exchanges a refresh token for a new access token.
///
/// # Returns
///
/// * `Ok(Some(token))` - Refresh succeeded
/// * `Ok(None)` - The authorization server rejected the refresh token (`invalid_grant`)
/// * `Err(_)` - Network or other error occurred
pub async fn refresh(
    client_id: &str,
    client_secret: &str,
    token_uri: &str,
    refresh_token: &RefreshToken,
) -> Result<Option<BasicTokenResponse>, Error> {
    tracing::debug!("attempting to refresh OAuth token");

    let client = BasicClient::new(ClientId::new(client_id.to_string()))
        .set_client_secret(ClientSecret::new(client_secret.to_string()))
        .set_token_uri(token_url(token_uri)?);

    let http_client = token_http_client()?;
    match client
        .exchange_refresh_token(refresh_token)
        .request_async(&http_client)
        .await
    {
        Ok(new_token) => {
            tracing::debug!("successfully refreshed OAuth token");
            Ok(Some(new_token))
        }
        Err(ref e @ RequestTokenError::ServerResponse(ref sr))
            if matches!(sr.error(), BasicErrorResponseType::InvalidGrant) =>
        {
            tracing::warn!("OAuth refresh token considered invalid grant: {}", e);
            Ok(None)
        }
        Err(e) => Err(Error::auth_caused_by("exchange refresh token", e)),
    }
}

/// Sets up a local HTTP server to receive the OAuth authorization callback.
///
/// Binds a random loopback port, validates the CSRF state of the first request that arrives,
/// and resolves to the authorization code it carries.
///
/// # Returns
///
/// A tuple containing:
/// - The redirect URL to use in the OAuth flow
/// - A future that resolves to the authorization code when the callback is received
async fn setup_redirect(
    csrf: CsrfToken,
) -> eyre::Result<(
    RedirectUrl,
    impl Future<Output = eyre::Result<AuthorizationCode>>,
)> {
    let socket = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind to localhost")?;
    let addr = socket.local_addr().context("get local address")?;
    let url = RedirectUrl::new(format!("http://{}:{}", addr.ip(), addr.port()))
        .context("construct redirect url")?;
    let (tx, rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let r = async move {
            let (conn, _) = socket.accept().await.context("accept")?;
            let conn = hyper_util::rt::TokioIo::new(conn);
            let (got, mut gotten) = tokio::sync::mpsc::channel(1);
            let service = service_fn(move |req: Request<body::Incoming>| {
                let csrf = csrf.clone();
                let got = got.clone();
                async move {
                    let mut presented_state = None;
                    let mut presented_code = None;
                    let mut presented_error = None;
                    for (k, v) in form_urlencoded::parse(req.uri().query().unwrap_or("").as_bytes())
                    {
                        match &*k {
                            "state" => presented_state = Some(v),
                            "code" => presented_code = Some(v),
                            "error" => presented_error = Some(v),
                            _ => {}
                        }
                    }
                    if presented_state.as_deref() != Some(csrf.secret().as_str()) {
                        return Err("invalid csrf token");
                    }
                    let outcome = match (presented_code, presented_error) {
                        (Some(code), _) => Ok(AuthorizationCode::new(code.into_owned())),
                        (None, Some(error)) => Err(error.into_owned()),
                        (None, None) => return Err("no authorization code found"),
                    };
                    let reply = if outcome.is_ok() {
                        OAUTH_DONE
                    } else {
                        "Authorization was declined. You can close this window."
                    };
                    // the receiver only goes away once the server is done
                    let _ = got.send(outcome).await;
                    Ok(Response::new(Full::<Bytes>::from(reply)))
                }
            });
            let mut serve = std::pin::pin!(
                hyper::server::conn::http1::Builder::new().serve_connection(conn, service)
            );

            tokio::select! {
                exit = &mut serve => {
                    if let Err(e) = exit {
                        Err(e).context("redirect server got bad request")
                    } else {
                        eyre::bail!("redirect server exit prematurely");
                    }
                }
                outcome = gotten.recv() => {
                    serve.as_mut().graceful_shutdown();
                    // let the confirmation page reach the browser
                    let _ = serve.await;
                    match outcome {
                        Some(Ok(code)) => Ok(code),
                        Some(Err(error)) => eyre::bail!("authorization denied: {error}"),
                        None => eyre::bail!("redirect handler went away"),
                    }
                }
            }
        };
        let _ = tx.send(r.await);
    });
    Ok((url, async move {
        rx.await.context("redirect future dropped prematurely")?
    }))
}
