//! Environment-driven configuration for both acquisition flows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
pub const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// How tokens are acquired for downstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthMethod {
    /// User-delegated device authorization grant; tokens are obtained
    /// interactively and supplied to callers out-of-band.
    DeviceCode,
    /// App-only client credentials grant; tokens are acquired and cached
    /// automatically.
    ClientCredentials,
}

impl FromStr for AuthMethod {
    type Err = AuthError;

    fn from_str(value: &str) -> Result<Self, AuthError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEVICE_CODE" => Ok(Self::DeviceCode),
            "CLIENT_CREDENTIALS" => Ok(Self::ClientCredentials),
            _ => Err(AuthError::InvalidMethod(value.to_string())),
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceCode => write!(f, "DEVICE_CODE"),
            Self::ClientCredentials => write!(f, "CLIENT_CREDENTIALS"),
        }
    }
}

/// Immutable configuration loaded once at startup.
///
/// # Example
/// ```no_run
/// use entra_auth::{AuthConfig, AuthMethod};
///
/// let config = AuthConfig::new(AuthMethod::ClientCredentials, "tenant-id", "client-id")
///     .with_client_secret("client-secret")
///     .with_scope("api://my-app/.default");
/// ```
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub method: AuthMethod,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub scope: String,
    authority: String,
    access_token_url: Option<String>,
}

impl AuthConfig {
    pub fn new(
        method: AuthMethod,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            method,
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: None,
            scope: DEFAULT_SCOPE.to_string(),
            authority: DEFAULT_AUTHORITY.to_string(),
            access_token_url: None,
        }
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    pub fn with_access_token_url(mut self, url: impl Into<String>) -> Self {
        self.access_token_url = Some(url.into());
        self
    }

    /// Load configuration from the environment (`.env` honored if present).
    ///
    /// Recognized variables: `AUTH_METHOD`, `TENANT_ID`, `CLIENT_ID`,
    /// `CLIENT_SECRET`, `OAUTH2_SCOPE`, `ACCESS_TOKEN_URL`. Missing
    /// credential fields are tolerated here; each flow validates the
    /// fields it needs before issuing any request.
    pub fn from_env() -> Result<Self, AuthError> {
        let _ = dotenvy::dotenv();
        let method: AuthMethod = std::env::var("AUTH_METHOD")
            .unwrap_or_else(|_| "DEVICE_CODE".to_string())
            .parse()?;
        let mut config = Self::new(
            method,
            std::env::var("TENANT_ID").unwrap_or_default(),
            std::env::var("CLIENT_ID").unwrap_or_default(),
        );
        if let Ok(secret) = std::env::var("CLIENT_SECRET") {
            config = config.with_client_secret(secret);
        }
        if let Ok(scope) = std::env::var("OAUTH2_SCOPE") {
            config = config.with_scope(scope);
        }
        if let Ok(url) = std::env::var("ACCESS_TOKEN_URL") {
            config = config.with_access_token_url(url);
        }
        Ok(config)
    }

    pub fn device_code_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/devicecode",
            self.authority, self.tenant_id
        )
    }

    /// Token endpoint; `ACCESS_TOKEN_URL` override wins when set.
    pub fn token_url(&self) -> String {
        match &self.access_token_url {
            Some(url) => url.clone(),
            None => format!("{}/{}/oauth2/v2.0/token", self.authority, self.tenant_id),
        }
    }

    /// Fields required by `method` that are currently absent or empty.
    pub fn missing_fields(&self, method: AuthMethod) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.tenant_id.trim().is_empty() {
            missing.push("TENANT_ID");
        }
        if self.client_id.trim().is_empty() {
            missing.push("CLIENT_ID");
        }
        if method == AuthMethod::ClientCredentials
            && self
                .client_secret
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .is_empty()
        {
            missing.push("CLIENT_SECRET");
        }
        missing
    }

    /// Validate the fields the device flow needs.
    pub fn require_device_fields(&self) -> Result<(), AuthError> {
        let missing = self.missing_fields(AuthMethod::DeviceCode);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AuthError::MissingConfig(missing.join(", ")))
        }
    }

    /// Validate the fields the client-credentials flow needs and hand back
    /// the secret.
    pub fn require_client_credential_fields(&self) -> Result<&str, AuthError> {
        let missing = self.missing_fields(AuthMethod::ClientCredentials);
        if !missing.is_empty() {
            return Err(AuthError::MissingConfig(missing.join(", ")));
        }
        // missing_fields guarantees the secret is present and non-empty
        Ok(self.client_secret.as_deref().unwrap_or_default())
    }

    /// Describe configuration validity for the configured method.
    pub fn report(&self) -> ConfigReport {
        let missing = self.missing_fields(self.method);
        ConfigReport {
            method: self.method,
            tenant_id_set: !self.tenant_id.trim().is_empty(),
            client_id_set: !self.client_id.trim().is_empty(),
            client_secret_set: self.client_secret.is_some(),
            scope: self.scope.clone(),
            ready: missing.is_empty(),
            missing,
        }
    }
}

/// Point-in-time view of configuration validity; never carries secrets.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigReport {
    pub method: AuthMethod,
    pub tenant_id_set: bool,
    pub client_id_set: bool,
    pub client_secret_set: bool,
    pub scope: String,
    pub ready: bool,
    pub missing: Vec<&'static str>,
}
