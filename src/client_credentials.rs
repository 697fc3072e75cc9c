//! RFC 6749 client credentials grant: single-shot app-only acquisition.

use chrono::Utc;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::{Token, TokenResponse};

const CLIENT_CREDENTIALS_GRANT: &str = "client_credentials";

/// Client for the app-only client credentials grant.
///
/// One POST per call; retry policy belongs to the caller (the cache layer
/// simply re-acquires on the next miss).
pub struct ClientCredentialsFlow {
    client: reqwest::Client,
    config: AuthConfig,
}

impl ClientCredentialsFlow {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Acquire an app-only token.
    ///
    /// Fails with [`AuthError::MissingConfig`] naming every absent field
    /// before any request; non-2xx responses surface verbatim as
    /// [`AuthError::Server`].
    pub async fn acquire(&self) -> Result<Token, AuthError> {
        let secret = self.config.require_client_credential_fields()?;
        tracing::info!(client_id = %self.config.client_id, "requesting app-only token");
        let resp = self
            .client
            .post(self.config.token_url())
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", CLIENT_CREDENTIALS_GRANT),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", secret),
                ("scope", self.config.scope.as_str()),
            ])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "app-only token request failed");
            return Err(AuthError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let body = resp.text().await?;
        let payload: TokenResponse = serde_json::from_str(&body)
            .map_err(|err| AuthError::InvalidResponse(format!("token payload: {err}")))?;
        let token = Token::from_wire(payload, Utc::now());
        tracing::info!(expires_at = %token.expires_at, "app-only token acquired");
        Ok(token)
    }
}
