//! RFC 8628 device authorization grant: initiation and the polling loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::{Token, TokenErrorResponse, TokenResponse};

pub const DEFAULT_EXPIRES_IN_SECS: u64 = 900;
pub const DEFAULT_INTERVAL_SECS: u64 = 5;
/// Added to the poll interval on every `slow_down`, per RFC 8628 §3.5.
pub const SLOW_DOWN_STEP_SECS: u64 = 5;

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Suspension seam for the polling loop; tests substitute a recorder so
/// polls run without wall-clock delay.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Default sleeper backed by the tokio timer.
#[derive(Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Device authorization session returned by [`DeviceCodeFlow::start`].
///
/// Serializable so it can survive between the "start" and "complete" halves
/// of the flow; consumed by the poller and invalid after `expires_at` or
/// the first successful poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSession {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub interval_secs: u64,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of a single poll attempt against the token endpoint.
#[derive(Debug, Clone)]
pub enum DevicePoll {
    Authorized { token: Token },
    Pending,
    SlowDown,
    Declined,
    Expired,
    Other { code: String, description: String },
}

/// Client for the device authorization grant.
pub struct DeviceCodeFlow {
    client: reqwest::Client,
    config: AuthConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl DeviceCodeFlow {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Begin a device authorization session.
    ///
    /// Fails with [`AuthError::MissingConfig`] before any request when
    /// `TENANT_ID` or `CLIENT_ID` is absent; initiation failures from the
    /// server are surfaced verbatim and never retried.
    pub async fn start(&self) -> Result<DeviceSession, AuthError> {
        self.config.require_device_fields()?;
        tracing::info!(client_id = %self.config.client_id, "initiating device authorization");
        let resp = self
            .client
            .post(self.config.device_code_url())
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("scope", self.config.scope.as_str()),
            ])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "device flow initiation failed");
            return Err(AuthError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let body = resp.text().await?;
        let payload: DeviceCodeResponse = serde_json::from_str(&body).map_err(|err| {
            AuthError::InvalidResponse(format!("device authorization payload: {err}"))
        })?;
        let expires_at = Utc::now() + chrono::Duration::seconds(payload.expires_in as i64);
        tracing::info!(user_code = %payload.user_code, "device authorization started");
        Ok(DeviceSession {
            device_code: payload.device_code,
            user_code: payload.user_code,
            verification_uri: payload.verification_uri,
            interval_secs: payload.interval,
            expires_at,
        })
    }

    /// Classify one poll attempt.
    ///
    /// The Microsoft token endpoint reports in-progress states as non-2xx
    /// with a JSON `error` body, so the body is parsed on any status; a
    /// failure body without a recognizable error payload surfaces as
    /// [`AuthError::Server`], and a success body that is not a token
    /// payload as [`AuthError::InvalidResponse`].
    pub async fn poll_once(&self, session: &DeviceSession) -> Result<DevicePoll, AuthError> {
        let resp = self
            .client
            .post(self.config.token_url())
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", DEVICE_CODE_GRANT),
                ("client_id", self.config.client_id.as_str()),
                ("device_code", session.device_code.as_str()),
            ])
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            let payload: TokenResponse = serde_json::from_str(&body)
                .map_err(|err| AuthError::InvalidResponse(format!("token payload: {err}")))?;
            return Ok(DevicePoll::Authorized {
                token: Token::from_wire(payload, Utc::now()),
            });
        }
        let body = resp.text().await.unwrap_or_default();
        let Ok(failure) = serde_json::from_str::<TokenErrorResponse>(&body) else {
            return Err(AuthError::Server {
                status: status.as_u16(),
                body,
            });
        };
        Ok(match failure.error.as_str() {
            "authorization_pending" => DevicePoll::Pending,
            "slow_down" => DevicePoll::SlowDown,
            "authorization_declined" => DevicePoll::Declined,
            "expired_token" => DevicePoll::Expired,
            _ => DevicePoll::Other {
                code: failure.error,
                description: failure.error_description,
            },
        })
    }

    /// Poll until the user authorizes, a terminal outcome occurs, or the
    /// attempt budget is exhausted.
    ///
    /// `Pending` sleeps the current interval unchanged; `SlowDown` adds
    /// [`SLOW_DOWN_STEP_SECS`] to the interval (cumulative, and it persists
    /// across later `Pending` responses) before sleeping. Exhausting
    /// `max_attempts` fails with [`AuthError::Timeout`] after exactly that
    /// many attempts. Cancellation is honored at every suspension point and
    /// leaves no state behind.
    pub async fn poll_until_authorized(
        &self,
        session: &DeviceSession,
        max_attempts: u32,
        cancel: &CancellationToken,
    ) -> Result<Token, AuthError> {
        let mut interval = Duration::from_secs(session.interval_secs);
        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(AuthError::Cancelled);
            }
            if Utc::now() >= session.expires_at {
                return Err(AuthError::DeviceCodeExpired);
            }
            tracing::debug!(attempt, max_attempts, "polling token endpoint");
            match self.poll_once(session).await? {
                DevicePoll::Authorized { token } => {
                    tracing::info!("device authorization granted");
                    return Ok(token);
                }
                DevicePoll::Pending => {}
                DevicePoll::SlowDown => {
                    interval += Duration::from_secs(SLOW_DOWN_STEP_SECS);
                    tracing::warn!(
                        interval_secs = interval.as_secs(),
                        "token endpoint requested slow down"
                    );
                }
                DevicePoll::Declined => return Err(AuthError::Declined),
                DevicePoll::Expired => return Err(AuthError::DeviceCodeExpired),
                DevicePoll::Other { code, description } => {
                    return Err(AuthError::Grant { code, description });
                }
            }
            // No point sleeping after the final attempt.
            if attempt < max_attempts {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(AuthError::Cancelled),
                    _ = self.sleeper.sleep(interval) => {}
                }
            }
        }
        Err(AuthError::Timeout(max_attempts))
    }
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
    #[serde(default = "default_interval")]
    interval: u64,
}

fn default_expires_in() -> u64 {
    DEFAULT_EXPIRES_IN_SECS
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}
