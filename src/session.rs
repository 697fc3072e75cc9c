//! Scratch persistence for the device flow: the pending session between
//! the "start" and "complete" halves, and the bearer token handed off
//! after a completed flow.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device_code::DeviceSession;
use crate::error::AuthError;
use crate::token::Token;

const SESSION_FILE_VERSION: u32 = 1;
const SESSION_FILE_NAME: &str = "pending-session.toml";
const TOKEN_FILE_VERSION: u32 = 1;
const TOKEN_FILE_NAME: &str = "bearer-token.toml";

/// Storage for the device flow's scratch state: one pending session and
/// one completed bearer token per process.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<DeviceSession>, AuthError>;
    fn save(&self, session: &DeviceSession) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
    fn load_token(&self) -> Result<Option<Token>, AuthError>;
    fn save_token(&self, token: &Token) -> Result<(), AuthError>;
    fn clear_token(&self) -> Result<(), AuthError>;
}

/// File-backed session store using TOML scratch files.
///
/// # Example
/// ```no_run
/// use entra_auth::{FileSessionStore, SessionStore};
///
/// let store = FileSessionStore::new_default();
/// let pending = store.load()?;
/// # Ok::<(), entra_auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    session_path: PathBuf,
    token_path: PathBuf,
}

impl FileSessionStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            session_path: base_dir.join(SESSION_FILE_NAME),
            token_path: base_dir.join(TOKEN_FILE_NAME),
        }
    }

    pub fn new_default() -> Self {
        Self::new(default_state_dir())
    }

    fn write_secret_file(path: &Path, contents: &str) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn read_file(path: &Path) -> Result<Option<String>, AuthError> {
        match fs::read_to_string(path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }

    fn remove_file(path: &Path) -> Result<(), AuthError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<DeviceSession>, AuthError> {
        let Some(raw) = Self::read_file(&self.session_path)? else {
            return Ok(None);
        };
        let file: SessionFile = toml::from_str(&raw)?;
        Ok(Some(file.session))
    }

    fn save(&self, session: &DeviceSession) -> Result<(), AuthError> {
        let file = SessionFile {
            version: SESSION_FILE_VERSION,
            saved_at: Utc::now(),
            session: session.clone(),
        };
        Self::write_secret_file(&self.session_path, &toml::to_string(&file)?)
    }

    fn clear(&self) -> Result<(), AuthError> {
        Self::remove_file(&self.session_path)
    }

    fn load_token(&self) -> Result<Option<Token>, AuthError> {
        let Some(raw) = Self::read_file(&self.token_path)? else {
            return Ok(None);
        };
        let file: TokenFile = toml::from_str(&raw)?;
        Ok(Some(file.token))
    }

    fn save_token(&self, token: &Token) -> Result<(), AuthError> {
        let file = TokenFile {
            version: TOKEN_FILE_VERSION,
            saved_at: Utc::now(),
            token: token.clone(),
        };
        Self::write_secret_file(&self.token_path, &toml::to_string(&file)?)
    }

    fn clear_token(&self) -> Result<(), AuthError> {
        Self::remove_file(&self.token_path)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    saved_at: DateTime<Utc>,
    session: DeviceSession,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenFile {
    version: u32,
    saved_at: DateTime<Utc>,
    token: Token,
}

fn default_state_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".entra-auth"))
        .unwrap_or_else(|| PathBuf::from(".entra-auth"))
}
