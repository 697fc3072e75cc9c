use thiserror::Error;

/// What a caller should do about a failed operation.
///
/// Every [`AuthError`] maps to exactly one remedy so hosts can distinguish
/// "try again later" from "restart the flow" from "fix configuration"
/// without string-matching messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remedy {
    /// Transient: the same call may succeed later.
    TryAgainLater,
    /// The current device session or cached state is unusable; start over.
    RestartFlow,
    /// Configuration must change before the call can ever succeed.
    FixConfiguration,
}

/// Errors surfaced by token acquisition and caching.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing configuration: {0}")]
    MissingConfig(String),
    #[error("Authorization server returned status {status}: {body}")]
    Server { status: u16, body: String },
    #[error("User declined the authorization")]
    Declined,
    #[error("Device code expired, restart the flow")]
    DeviceCodeExpired,
    #[error("Token endpoint error {code}: {description}")]
    Grant { code: String, description: String },
    #[error("Polling timed out after {0} attempts")]
    Timeout(u32),
    #[error("Polling was cancelled")]
    Cancelled,
    #[error("AUTH_METHOD is DEVICE_CODE: automatic acquisition is disabled, supply a token obtained via the device flow")]
    ManualTokenRequired,
    #[error("Unrecognized auth method: {0}")]
    InvalidMethod(String),
    #[error("No pending device session; start the device flow first")]
    NoPendingSession,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Classify this error into a caller remedy.
    pub fn remedy(&self) -> Remedy {
        match self {
            Self::MissingConfig(_) | Self::ManualTokenRequired | Self::InvalidMethod(_) => {
                Remedy::FixConfiguration
            }
            Self::Declined
            | Self::DeviceCodeExpired
            | Self::Grant { .. }
            | Self::Cancelled
            | Self::NoPendingSession
            | Self::Serialization(_) => Remedy::RestartFlow,
            Self::Server { .. }
            | Self::Timeout(_)
            | Self::InvalidResponse(_)
            | Self::Network(_)
            | Self::Io(_) => Remedy::TryAgainLater,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
