//! Single-slot, expiry-aware token cache.

use std::future::Future;

use tokio::sync::Mutex;

use crate::error::AuthError;
use crate::token::Token;

/// Holds at most one token record for the process's single active
/// credential.
///
/// The slot lock is held across a miss's acquisition, so concurrent callers
/// on a cold cache produce exactly one outbound request; the rest wait and
/// reuse the stored result. A failed acquisition leaves the previous record
/// (possibly absent) untouched.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<Token>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token while it is valid, otherwise run `acquire`
    /// and store its result.
    pub async fn get_or_acquire<F, Fut>(&self, acquire: F) -> Result<Token, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Token, AuthError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            if token.is_valid() {
                tracing::debug!(expires_at = %token.expires_at, "token cache hit");
                return Ok(token.clone());
            }
            tracing::debug!(expires_at = %token.expires_at, "cached token expired");
        }
        let token = acquire().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Current record, valid or not, without acquiring.
    pub async fn peek(&self) -> Option<Token> {
        self.slot.lock().await.clone()
    }

    pub async fn clear(&self) {
        *self.slot.lock().await = None;
    }
}
