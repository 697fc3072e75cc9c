use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Margin subtracted from a token's reported lifetime so a token is never
/// presented right at its expiry boundary.
pub const EXPIRY_SAFETY_BUFFER_SECS: i64 = 300;

/// Bearer token acquired from the token endpoint.
///
/// `expires_at` is the acquisition time plus the server-reported lifetime
/// minus [`EXPIRY_SAFETY_BUFFER_SECS`]. Records are replaced wholesale,
/// never mutated in place.
///
/// # Example
/// ```no_run
/// use entra_auth::Token;
/// use chrono::Utc;
///
/// let token = Token {
///     access_token: "eyJ0eXAi...".to_string(),
///     token_type: "Bearer".to_string(),
///     expires_in: 3599,
///     scope: "https://graph.microsoft.com/.default".to_string(),
///     expires_at: Utc::now() + chrono::Duration::seconds(3299),
/// };
/// assert!(token.is_valid());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub(crate) fn from_wire(payload: TokenResponse, acquired_at: DateTime<Utc>) -> Self {
        let expires_at =
            acquired_at + Duration::seconds(payload.expires_in as i64 - EXPIRY_SAFETY_BUFFER_SECS);
        Self {
            access_token: payload.access_token,
            token_type: payload.token_type,
            expires_in: payload.expires_in,
            scope: payload.scope,
            expires_at,
        }
    }

    /// Whether the token is still usable right now.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Whether the token is usable at `now` (buffered expiry is exclusive).
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Successful token endpoint payload, shared by both grant types.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub scope: String,
}

/// Error payload the token endpoint attaches to non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn wire(expires_in: u64) -> TokenResponse {
        TokenResponse {
            access_token: "secret".to_string(),
            token_type: "Bearer".to_string(),
            expires_in,
            scope: "api://app/.default".to_string(),
        }
    }

    #[test]
    fn expiry_includes_safety_buffer() {
        let acquired = Utc::now();
        let token = Token::from_wire(wire(3600), acquired);
        assert_eq!(
            token.expires_at,
            acquired + Duration::seconds(3600 - EXPIRY_SAFETY_BUFFER_SECS)
        );
    }

    #[test]
    fn validity_is_exclusive_at_the_boundary() {
        let acquired = Utc::now();
        let token = Token::from_wire(wire(3600), acquired);
        assert!(token.is_valid_at(token.expires_at - Duration::seconds(1)));
        assert!(!token.is_valid_at(token.expires_at));
        assert!(!token.is_valid_at(token.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn serde_round_trip_preserves_fields() {
        let token = Token::from_wire(wire(900), Utc::now());
        let raw = serde_json::to_string(&token).unwrap();
        let back: Token = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.access_token, token.access_token);
        assert_eq!(back.expires_in, token.expires_in);
        assert_eq!(back.scope, token.scope);
        assert_eq!(back.expires_at, token.expires_at);
    }

    #[test]
    fn wire_defaults_apply_when_fields_are_omitted() {
        let payload: TokenResponse =
            serde_json::from_str(r#"{"access_token":"tok","expires_in":60}"#).unwrap();
        assert_eq!(payload.token_type, "Bearer");
        assert_eq!(payload.scope, "");
    }
}
