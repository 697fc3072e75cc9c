//! OAuth 2.0 bearer-token acquisition for the Microsoft identity platform.
//!
//! Two acquisition strategies behind one facade: the RFC 8628 device
//! authorization grant (user-delegated, requires out-of-band browser
//! interaction) with a bounded, backoff-aware polling loop, and the
//! RFC 6749 client credentials grant (app-only) behind an expiry-aware
//! single-slot cache.
//!
//! # Quick Start
//!
//! ```no_run
//! use entra_auth::AuthService;
//!
//! # async fn example() -> Result<(), entra_auth::AuthError> {
//! let service = AuthService::from_env()?;
//! let token = service.resolve_token().await?;
//! println!("Bearer {}", token.access_token);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client_credentials;
pub mod config;
pub mod device_code;
pub mod error;
pub mod service;
pub mod session;
pub mod token;

pub use cache::TokenCache;
pub use client_credentials::ClientCredentialsFlow;
pub use config::{AuthConfig, AuthMethod, ConfigReport};
pub use device_code::{DeviceCodeFlow, DevicePoll, DeviceSession, Sleeper, TokioSleeper};
pub use error::{AuthError, Remedy};
pub use service::{
    AuthService, DeviceLoginPrompt, TokenProbe, TokenStatus, COMPLETE_MAX_ATTEMPTS,
    ONE_SHOT_MAX_ATTEMPTS,
};
pub use session::{FileSessionStore, SessionStore};
pub use token::{Token, EXPIRY_SAFETY_BUFFER_SECS};
