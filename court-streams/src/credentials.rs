//! Credential lifecycle: load, refresh, or re-authorize, then persist.
//!
//! The [`CredentialManager`] is the only component that sees the raw token. Everything else gets
//! a [`YouTubeClient`] from [`CredentialManager::obtain_client`].
//!
//! # Token Lifecycle
//!
//! 1. A stored token that is still fresh is used as-is, without touching the store.
//! 2. A stored token that has expired is refreshed through its refresh token
//!    ([`CachedTokenProvider`]).
//! 3. If there is no stored token, or the refresh failed, the operator is sent through the
//!    browser flow ([`InteractiveAuthProvider`]).
//!
//! Whatever comes out of 2 or 3 is written back to the store before it is used.

use crate::error::Error;
use crate::oauth::{self, ClientSecrets, YOUTUBE_SCOPE};
use crate::youtube_api::YouTubeClient;
use jiff::{SignedDuration, Timestamp};
use oauth2::basic::BasicTokenResponse;
use oauth2::{AccessToken, RefreshToken, TokenResponse};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Tokens are treated as expired this long before their actual expiry.
const EXPIRY_SAFETY_WINDOW: SignedDuration = SignedDuration::from_mins(5);

/// Assumed lifetime when the authorization server does not say.
const DEFAULT_LIFETIME: SignedDuration = SignedDuration::from_mins(55);

/// A persisted OAuth credential, in Google's "authorized user" layout.
///
/// The client id and secret travel with the token so that a refresh does not need the client
/// secrets file.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    pub token: AccessToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<RefreshToken>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// When the access token stops working. Missing means unknown, which counts as expired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Timestamp>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl Credential {
    /// Builds a credential from a fresh token endpoint response.
    pub fn from_token_response(
        token: &BasicTokenResponse,
        secrets: &ClientSecrets,
        now: Timestamp,
    ) -> Self {
        Self {
            token: token.access_token().clone(),
            refresh_token: token.refresh_token().cloned(),
            token_uri: secrets.token_uri.clone(),
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            scopes: token
                .scopes()
                .map(|scopes| scopes.iter().map(|s| s.as_str().to_owned()).collect())
                .unwrap_or_else(|| vec![YOUTUBE_SCOPE.to_string()]),
            expiry: Some(Self::expiry_of(token, now)),
        }
    }

    /// Applies a refresh response, keeping the old refresh token if no new one was issued.
    pub fn renewed(mut self, token: &BasicTokenResponse, now: Timestamp) -> Self {
        self.token = token.access_token().clone();
        if let Some(refresh_token) = token.refresh_token() {
            tracing::debug!("new token includes refresh token");
            self.refresh_token = Some(refresh_token.clone());
        } else {
            tracing::trace!("new token lacks refresh token, preserving original");
        }
        if let Some(scopes) = token.scopes() {
            self.scopes = scopes.iter().map(|s| s.as_str().to_owned()).collect();
        }
        self.expiry = Some(Self::expiry_of(token, now));
        self
    }

    /// Whether the access token can be used for at least the next few minutes.
    pub fn is_fresh(&self, now: Timestamp) -> bool {
        self.expiry.is_some_and(|expiry| now + EXPIRY_SAFETY_WINDOW < expiry)
    }

    fn expiry_of(token: &BasicTokenResponse, now: Timestamp) -> Timestamp {
        let lifetime = token
            .expires_in()
            .and_then(|d| SignedDuration::try_from(d).ok())
            .unwrap_or(DEFAULT_LIFETIME);
        now + lifetime
    }
}

/// The token file on disk.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored credential, if any.
    ///
    /// A file that exists but cannot be read or parsed is logged and treated like a missing one,
    /// so the operator is sent through authorization again instead of being stuck.
    pub async fn load(&self) -> Result<Option<Credential>, Error> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no stored token");
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring unreadable token file: {e}");
                return Ok(None);
            }
        };
        match serde_json::from_str(&raw) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring unparseable token file: {e}");
                Ok(None)
            }
        }
    }

    /// Overwrites the stored credential.
    pub async fn save(&self, credential: &Credential) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(credential)
            .map_err(|e| Error::io(&self.path, std::io::Error::other(e)))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| Error::io(&self.path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| Error::io(&self.path, e))?;
        }

        tracing::debug!(path = %self.path.display(), "stored token");
        Ok(())
    }
}

/// A source of usable credentials.
#[allow(async_fn_in_trait)]
pub trait TokenProvider {
    async fn provide(&self) -> Result<Credential, Error>;
}

/// Exchanges refresh tokens with the authorization server.
#[allow(async_fn_in_trait)]
pub trait TokenRefresher {
    /// `Ok(None)` means the authorization server rejected the refresh token.
    async fn refresh(
        &self,
        credential: &Credential,
        refresh_token: &RefreshToken,
    ) -> Result<Option<BasicTokenResponse>, Error>;
}

/// Refreshes against the token endpoint recorded in the credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct OAuthRefresher;

impl TokenRefresher for OAuthRefresher {
    async fn refresh(
        &self,
        credential: &Credential,
        refresh_token: &RefreshToken,
    ) -> Result<Option<BasicTokenResponse>, Error> {
        oauth::refresh(
            &credential.client_id,
            &credential.client_secret,
            &credential.token_uri,
            refresh_token,
        )
        .await
    }
}

/// Provides the stored credential, refreshing it first if it has expired.
#[derive(Debug)]
pub struct CachedTokenProvider<'a, R> {
    credential: Credential,
    refresher: &'a R,
}

impl<'a, R> CachedTokenProvider<'a, R> {
    pub fn new(credential: Credential, refresher: &'a R) -> Self {
        Self {
            credential,
            refresher,
        }
    }
}

impl<R: TokenRefresher> TokenProvider for CachedTokenProvider<'_, R> {
    async fn provide(&self) -> Result<Credential, Error> {
        let now = Timestamp::now();
        if self.credential.is_fresh(now) {
            return Ok(self.credential.clone());
        }

        let Some(refresh_token) = &self.credential.refresh_token else {
            return Err(Error::auth("stored token expired and has no refresh token"));
        };

        tracing::info!("stored token expired, refreshing");
        match self
            .refresher
            .refresh(&self.credential, refresh_token)
            .await?
        {
            Some(token) => Ok(self.credential.clone().renewed(&token, Timestamp::now())),
            None => Err(Error::auth("refresh token rejected by authorization server")),
        }
    }
}

/// Sends the operator through the browser consent flow.
#[derive(Debug, Clone)]
pub struct InteractiveAuthProvider {
    client_secrets: PathBuf,
}

impl InteractiveAuthProvider {
    pub fn new(client_secrets: impl Into<PathBuf>) -> Self {
        Self {
            client_secrets: client_secrets.into(),
        }
    }
}

impl TokenProvider for InteractiveAuthProvider {
    async fn provide(&self) -> Result<Credential, Error> {
        let secrets = ClientSecrets::load(&self.client_secrets)?;
        let token = oauth::authorize(&secrets).await?;
        Ok(Credential::from_token_response(
            &token,
            &secrets,
            Timestamp::now(),
        ))
    }
}

/// Owns the credential and hands out authenticated clients.
#[derive(Debug)]
pub struct CredentialManager<R = OAuthRefresher, I = InteractiveAuthProvider> {
    store: TokenStore,
    refresher: R,
    /// `None` when the browser flow is not allowed (e.g. under cron).
    interactive: Option<I>,
}

impl CredentialManager {
    /// A manager backed by Google's token endpoint and, if `interactive`, the browser flow.
    pub fn new(store: TokenStore, client_secrets: impl Into<PathBuf>, interactive: bool) -> Self {
        Self {
            store,
            refresher: OAuthRefresher,
            interactive: interactive.then(|| InteractiveAuthProvider::new(client_secrets)),
        }
    }
}

impl<R, I> CredentialManager<R, I>
where
    R: TokenRefresher,
    I: TokenProvider,
{
    pub fn with_providers(store: TokenStore, refresher: R, interactive: Option<I>) -> Self {
        Self {
            store,
            refresher,
            interactive,
        }
    }

    /// Produces a credential that is fresh for at least the safety window.
    ///
    /// The store is only written when the credential changed.
    pub async fn obtain_credential(&self) -> Result<Credential, Error> {
        let mut cached_failure = None;
        if let Some(stored) = self.store.load().await? {
            if stored.is_fresh(Timestamp::now()) {
                tracing::debug!("using stored token");
                return Ok(stored);
            }

            match CachedTokenProvider::new(stored, &self.refresher)
                .provide()
                .await
            {
                Ok(credential) => {
                    self.store.save(&credential).await?;
                    tracing::info!("refreshed stored token");
                    return Ok(credential);
                }
                Err(e) => {
                    tracing::warn!("cannot reuse stored token: {e}");
                    cached_failure = Some(e);
                }
            }
        }

        let Some(interactive) = &self.interactive else {
            return Err(match cached_failure {
                Some(e) => Error::auth_caused_by(
                    "stored token unusable and interactive authorization is disabled",
                    e,
                ),
                None => Error::auth(format!(
                    "no stored token at {} and interactive authorization is disabled",
                    self.store.path().display()
                )),
            });
        };

        let credential = interactive.provide().await?;
        self.store.save(&credential).await?;
        Ok(credential)
    }

    /// Produces a client for the YouTube API at `api_base`.
    pub async fn obtain_client(
        &self,
        api_base: &str,
        http: reqwest::Client,
    ) -> Result<YouTubeClient, Error> {
        let credential = self.obtain_credential().await?;
        Ok(YouTubeClient::new(credential.token, api_base, http))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oauth2::StandardTokenResponse;
    use oauth2::basic::BasicTokenType;
    use oauth2::EmptyExtraTokenFields;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::time::Duration;

    fn credential(expiry: Option<Timestamp>, refresh: Option<&str>) -> Credential {
        Credential {
            token: AccessToken::new("old-access".to_string()),
            refresh_token: refresh.map(|r| RefreshToken::new(r.to_string())),
            token_uri: oauth::GOOGLE_TOKEN_URI.to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec![YOUTUBE_SCOPE.to_string()],
            expiry,
        }
    }

    fn token_response(access: &str, refresh: Option<&str>) -> BasicTokenResponse {
        let mut token = StandardTokenResponse::new(
            AccessToken::new(access.to_string()),
            BasicTokenType::Bearer,
            EmptyExtraTokenFields {},
        );
        token.set_expires_in(Some(&Duration::from_secs(3599)));
        token.set_refresh_token(refresh.map(|r| RefreshToken::new(r.to_string())));
        token
    }

    fn in_an_hour() -> Option<Timestamp> {
        Some(Timestamp::now() + SignedDuration::from_hours(1))
    }

    fn an_hour_ago() -> Option<Timestamp> {
        Some(Timestamp::now() - SignedDuration::from_hours(1))
    }

    /// Answers refreshes with a canned response and counts calls.
    struct FakeRefresher {
        response: Option<BasicTokenResponse>,
        calls: Cell<usize>,
    }

    impl FakeRefresher {
        fn answering(response: Option<BasicTokenResponse>) -> Self {
            Self {
                response,
                calls: Cell::new(0),
            }
        }
    }

    impl TokenRefresher for FakeRefresher {
        async fn refresh(
            &self,
            _: &Credential,
            _: &RefreshToken,
        ) -> Result<Option<BasicTokenResponse>, Error> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.response.clone())
        }
    }

    /// Stands in for the browser flow.
    struct FakeInteractive {
        calls: Cell<usize>,
    }

    impl FakeInteractive {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
            }
        }
    }

    impl TokenProvider for FakeInteractive {
        async fn provide(&self) -> Result<Credential, Error> {
            self.calls.set(self.calls.get() + 1);
            let mut credential = credential(in_an_hour(), Some("brand-new-refresh"));
            credential.token = AccessToken::new("interactive-access".to_string());
            Ok(credential)
        }
    }

    async fn store_with(dir: &tempfile::TempDir, credential: Option<&Credential>) -> TokenStore {
        let store = TokenStore::new(dir.path().join("token.json"));
        if let Some(credential) = credential {
            store.save(credential).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn fresh_token_skips_refresh_and_authorization() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, Some(&credential(in_an_hour(), Some("r")))).await;
        let before = std::fs::read_to_string(store.path()).unwrap();

        let refresher = FakeRefresher::answering(None);
        let manager =
            CredentialManager::with_providers(store.clone(), refresher, Some(FakeInteractive::new()));
        let got = manager.obtain_credential().await.unwrap();

        assert_eq!(got.token.secret(), "old-access");
        assert_eq!(manager.refresher.calls.get(), 0);
        assert_eq!(manager.interactive.as_ref().unwrap().calls.get(), 0);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, Some(&credential(an_hour_ago(), Some("keep-me")))).await;

        let refresher = FakeRefresher::answering(Some(token_response("refreshed-access", None)));
        let manager =
            CredentialManager::with_providers(store.clone(), refresher, Some(FakeInteractive::new()));
        let got = manager.obtain_credential().await.unwrap();

        assert_eq!(got.token.secret(), "refreshed-access");
        assert_eq!(got.refresh_token.as_ref().unwrap().secret(), "keep-me");
        assert!(got.is_fresh(Timestamp::now()));
        assert_eq!(manager.refresher.calls.get(), 1);
        assert_eq!(manager.interactive.as_ref().unwrap().calls.get(), 0);

        let persisted = store.load().await.unwrap().unwrap();
        assert_eq!(persisted.token.secret(), "refreshed-access");
        assert_eq!(persisted.refresh_token.unwrap().secret(), "keep-me");
    }

    #[tokio::test]
    async fn rejected_refresh_falls_through_to_authorization() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, Some(&credential(an_hour_ago(), Some("revoked")))).await;

        let manager = CredentialManager::with_providers(
            store.clone(),
            FakeRefresher::answering(None),
            Some(FakeInteractive::new()),
        );
        let got = manager.obtain_credential().await.unwrap();

        assert_eq!(got.token.secret(), "interactive-access");
        assert_eq!(manager.refresher.calls.get(), 1);
        assert_eq!(manager.interactive.as_ref().unwrap().calls.get(), 1);
        let persisted = store.load().await.unwrap().unwrap();
        assert_eq!(persisted.token.secret(), "interactive-access");
    }

    #[tokio::test]
    async fn missing_token_runs_authorization() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, None).await;

        let manager = CredentialManager::with_providers(
            store.clone(),
            FakeRefresher::answering(None),
            Some(FakeInteractive::new()),
        );
        manager.obtain_credential().await.unwrap();

        assert_eq!(manager.refresher.calls.get(), 0);
        assert_eq!(manager.interactive.as_ref().unwrap().calls.get(), 1);
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn corrupt_token_file_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, None).await;
        std::fs::write(store.path(), b"\x80\x04\x95 not json").unwrap();

        let manager = CredentialManager::with_providers(
            store.clone(),
            FakeRefresher::answering(None),
            Some(FakeInteractive::new()),
        );
        let got = manager.obtain_credential().await.unwrap();
        assert_eq!(got.token.secret(), "interactive-access");
    }

    #[tokio::test]
    async fn no_path_to_a_token_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();

        let store = store_with(&dir, None).await;
        let manager = CredentialManager::with_providers(
            store,
            FakeRefresher::answering(None),
            None::<FakeInteractive>,
        );
        let err = manager.obtain_credential().await.unwrap_err();
        assert!(matches!(err, Error::Auth { .. }), "{err}");

        let store = store_with(&dir, Some(&credential(an_hour_ago(), None))).await;
        let manager = CredentialManager::with_providers(
            store,
            FakeRefresher::answering(None),
            None::<FakeInteractive>,
        );
        let err = manager.obtain_credential().await.unwrap_err();
        assert!(matches!(err, Error::Auth { .. }), "{err}");
        assert_eq!(manager.refresher.calls.get(), 0);
    }

    #[tokio::test]
    async fn interactive_without_client_secrets_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, None).await;
        let manager = CredentialManager::new(store, dir.path().join("client_secrets.json"), true);

        let err = manager.obtain_credential().await.unwrap_err();
        assert!(matches!(err, Error::Config { .. }), "{err}");
    }

    #[test]
    fn freshness_honours_safety_window() {
        let now = Timestamp::now();
        assert!(!credential(None, None).is_fresh(now));
        assert!(!credential(Some(now + SignedDuration::from_mins(4)), None).is_fresh(now));
        assert!(credential(Some(now + SignedDuration::from_mins(6)), None).is_fresh(now));
    }

    #[test]
    fn token_without_expires_in_gets_default_lifetime() {
        let now = Timestamp::now();
        let mut token = token_response("a", Some("r"));
        token.set_expires_in(None);
        let secrets = ClientSecrets {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_uri: oauth::GOOGLE_TOKEN_URI.to_string(),
        };

        let credential = Credential::from_token_response(&token, &secrets, now);
        assert_eq!(credential.expiry, Some(now + DEFAULT_LIFETIME));
        assert_eq!(credential.scopes, vec![YOUTUBE_SCOPE.to_string()]);
        assert_eq!(credential.refresh_token.unwrap().secret(), "r");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?}", credential(None, Some("refresh-secret")));
        assert!(!rendered.contains("old-access"));
        assert!(!rendered.contains("refresh-secret"));
        assert!(!rendered.contains("\"secret\""));
    }
}
