//! Facade exposing the host-facing auth operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::cache::TokenCache;
use crate::client_credentials::ClientCredentialsFlow;
use crate::config::{AuthConfig, AuthMethod, ConfigReport};
use crate::device_code::{DeviceCodeFlow, DeviceSession, Sleeper};
use crate::error::AuthError;
use crate::session::{FileSessionStore, SessionStore};
use crate::token::Token;

/// Attempt budget for the split "complete" step, which the user is expected
/// to call after finishing the browser authorization.
pub const COMPLETE_MAX_ATTEMPTS: u32 = 5;
/// Attempt budget for the blocking one-shot flow (about five minutes at the
/// default interval).
pub const ONE_SHOT_MAX_ATTEMPTS: u32 = 60;

const PROBE_SNIPPET_LEN: usize = 256;

/// What the caller must show the user after starting a device flow.
#[derive(Debug, Clone)]
pub struct DeviceLoginPrompt {
    pub user_code: String,
    pub verification_uri: String,
    pub interval_secs: u64,
    pub expires_at: DateTime<Utc>,
}

impl From<&DeviceSession> for DeviceLoginPrompt {
    fn from(session: &DeviceSession) -> Self {
        Self {
            user_code: session.user_code.clone(),
            verification_uri: session.verification_uri.clone(),
            interval_secs: session.interval_secs,
            expires_at: session.expires_at,
        }
    }
}

/// Snapshot of the cached app-only token, without re-acquiring.
#[derive(Debug, Clone)]
pub struct TokenStatus {
    pub token_type: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
    pub valid: bool,
}

/// Result of presenting a bearer token to an API endpoint.
#[derive(Debug, Clone)]
pub struct TokenProbe {
    pub status: u16,
    pub ok: bool,
    pub body_snippet: String,
}

/// Composition root for token acquisition.
///
/// Owns the configuration, the session scratch store, the token cache, and
/// both flows; all I/O decisions (printing, prompting) belong to the
/// caller.
///
/// # Example
/// ```no_run
/// use entra_auth::AuthService;
///
/// # async fn example() -> Result<(), entra_auth::AuthError> {
/// let service = AuthService::from_env()?;
/// let token = service.resolve_token().await?;
/// println!("Bearer {}", token.access_token);
/// # Ok(())
/// # }
/// ```
pub struct AuthService {
    config: AuthConfig,
    sessions: Arc<dyn SessionStore>,
    cache: TokenCache,
    device: DeviceCodeFlow,
    credentials: ClientCredentialsFlow,
    client: reqwest::Client,
    cancel: CancellationToken,
}

impl AuthService {
    pub fn new(config: AuthConfig, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            device: DeviceCodeFlow::new(config.clone()),
            credentials: ClientCredentialsFlow::new(config.clone()),
            cache: TokenCache::new(),
            client: reqwest::Client::new(),
            cancel: CancellationToken::new(),
            config,
            sessions,
        }
    }

    /// Build from environment configuration with the default file-backed
    /// session store.
    pub fn from_env() -> Result<Self, AuthError> {
        let config = AuthConfig::from_env()?;
        Ok(Self::new(config, Arc::new(FileSessionStore::new_default())))
    }

    /// Tie polling to an external shutdown signal.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.device = self.device.with_sleeper(sleeper);
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Report configuration validity for the configured method.
    pub fn config_report(&self) -> ConfigReport {
        self.config.report()
    }

    /// Acquire a token according to the configured method.
    ///
    /// `DeviceCode` mode always refuses: that flow needs synchronous human
    /// interaction, so callers run the device flow explicitly and read the
    /// result back via [`stored_device_token`](Self::stored_device_token).
    /// `ClientCredentials` goes through the cache and re-acquires only past
    /// the buffered expiry.
    pub async fn resolve_token(&self) -> Result<Token, AuthError> {
        match self.config.method {
            AuthMethod::DeviceCode => Err(AuthError::ManualTokenRequired),
            AuthMethod::ClientCredentials => {
                self.cache
                    .get_or_acquire(|| self.credentials.acquire())
                    .await
            }
        }
    }

    /// Start a device flow and persist the pending session for a later
    /// [`complete_device_login`](Self::complete_device_login).
    pub async fn start_device_login(&self) -> Result<DeviceLoginPrompt, AuthError> {
        let session = self.device.start().await?;
        self.sessions.save(&session)?;
        Ok(DeviceLoginPrompt::from(&session))
    }

    /// Finish a previously started device flow.
    ///
    /// Polls with a small budget ([`COMPLETE_MAX_ATTEMPTS`]) since the user
    /// is expected to have authorized already. On success the bearer token
    /// is persisted for [`stored_device_token`](Self::stored_device_token)
    /// and the pending session is removed; a timed-out completion leaves
    /// the session in place so it can be retried.
    pub async fn complete_device_login(&self) -> Result<Token, AuthError> {
        let session = self.sessions.load()?.ok_or(AuthError::NoPendingSession)?;
        let token = self
            .device
            .poll_until_authorized(&session, COMPLETE_MAX_ATTEMPTS, &self.cancel)
            .await?;
        self.sessions.save_token(&token)?;
        self.sessions.clear()?;
        Ok(token)
    }

    /// One-shot device flow: initiate, hand the prompt to the caller for
    /// display, then block polling until authorization or budget
    /// exhaustion. No session is persisted; the acquired token is, same as
    /// the split flow.
    pub async fn device_login<F>(&self, show_prompt: F) -> Result<Token, AuthError>
    where
        F: FnOnce(&DeviceLoginPrompt),
    {
        let session = self.device.start().await?;
        show_prompt(&DeviceLoginPrompt::from(&session));
        let token = self
            .device
            .poll_until_authorized(&session, ONE_SHOT_MAX_ATTEMPTS, &self.cancel)
            .await?;
        self.sessions.save_token(&token)?;
        Ok(token)
    }

    /// Retrieve the bearer token persisted by the last completed device
    /// flow, if any. The token is returned even when past its buffered
    /// expiry; callers can check [`Token::is_valid`].
    pub fn stored_device_token(&self) -> Result<Option<Token>, AuthError> {
        self.sessions.load_token()
    }

    /// Remove the persisted device-flow token.
    pub fn clear_stored_device_token(&self) -> Result<(), AuthError> {
        self.sessions.clear_token()
    }

    /// Describe the cached app-only token, if any.
    pub async fn cached_token_status(&self) -> Option<TokenStatus> {
        self.cache.peek().await.map(|token| TokenStatus {
            valid: token.is_valid(),
            token_type: token.token_type,
            scope: token.scope,
            expires_at: token.expires_at,
        })
    }

    /// Drop the cached app-only token; the next resolve re-acquires.
    pub async fn clear_cached_token(&self) {
        self.cache.clear().await;
    }

    /// Present a bearer token to an arbitrary API endpoint and report what
    /// came back. One GET, no retries.
    pub async fn probe_token(&self, endpoint: &str, bearer: &str) -> Result<TokenProbe, AuthError> {
        let resp = self
            .client
            .get(endpoint)
            .header("Accept", "application/json")
            .bearer_auth(bearer)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Ok(TokenProbe {
            status: status.as_u16(),
            ok: status.is_success(),
            body_snippet: body.chars().take(PROBE_SNIPPET_LEN).collect(),
        })
    }
}
