#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use entra_auth::{AuthConfig, AuthError, AuthMethod, DeviceSession, SessionStore, Sleeper, Token};

/// Session store double holding the pending session and the completed
/// bearer token in memory.
#[derive(Default)]
pub struct InMemorySessionStore {
    slot: Mutex<Option<DeviceSession>>,
    token: Mutex<Option<Token>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<DeviceSession> {
        self.slot.lock().expect("store lock poisoned").clone()
    }

    pub fn get_token(&self) -> Option<Token> {
        self.token.lock().expect("store lock poisoned").clone()
    }

    pub fn seed(&self, session: DeviceSession) {
        *self.slot.lock().expect("store lock poisoned") = Some(session);
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> Result<Option<DeviceSession>, AuthError> {
        Ok(self.get())
    }

    fn save(&self, session: &DeviceSession) -> Result<(), AuthError> {
        *self.slot.lock().expect("store lock poisoned") = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.slot.lock().expect("store lock poisoned") = None;
        Ok(())
    }

    fn load_token(&self) -> Result<Option<Token>, AuthError> {
        Ok(self.get_token())
    }

    fn save_token(&self, token: &Token) -> Result<(), AuthError> {
        *self.token.lock().expect("store lock poisoned") = Some(token.clone());
        Ok(())
    }

    fn clear_token(&self) -> Result<(), AuthError> {
        *self.token.lock().expect("store lock poisoned") = None;
        Ok(())
    }
}

/// Sleeper that records requested durations and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().expect("sleeper lock poisoned").clone()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept
            .lock()
            .expect("sleeper lock poisoned")
            .push(duration);
    }
}

pub fn device_config(authority: &str) -> AuthConfig {
    AuthConfig::new(AuthMethod::DeviceCode, "tenant-1", "client-1").with_authority(authority)
}

pub fn client_credentials_config(authority: &str) -> AuthConfig {
    AuthConfig::new(AuthMethod::ClientCredentials, "tenant-1", "client-1")
        .with_client_secret("client-secret-1")
        .with_authority(authority)
}

pub fn active_session(interval_secs: u64) -> DeviceSession {
    DeviceSession {
        device_code: "device-code-1".to_string(),
        user_code: "ABCD-EFGH".to_string(),
        verification_uri: "https://microsoft.com/devicelogin".to_string(),
        interval_secs,
        expires_at: Utc::now() + chrono::Duration::minutes(10),
    }
}
