//! Auth context and the small files that stand in for browser storage.
//!
//! `Session` is passed explicitly to every command: it carries the bearer
//! token and the selected profile. `TokenStore` persists it between runs,
//! `HandoffStore` keeps detection results until the food diary imports them.

use crate::GiziCareError;
use crate::food::HandoffItem;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// How long a remembered login stays valid.
pub const REMEMBER_DAYS: i64 = 7;

#[derive(Clone, Debug, Default)]
pub struct Session {
    token: Option<SecretString>,
    pub remember: bool,
    pub selected_profile_id: Option<u64>,
    /// `None` keeps the token until logout.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn signed_in(token: SecretString, remember: bool, now: DateTime<Utc>) -> Self {
        Self {
            token: Some(token),
            remember,
            selected_profile_id: None,
            expires_at: remember.then(|| now + Duration::days(REMEMBER_DAYS)),
        }
    }

    /// The token if present and not expired.
    pub fn token_at(&self, now: DateTime<Utc>) -> Option<&SecretString> {
        match self.expires_at {
            Some(expiry) if expiry <= now => None,
            _ => self.token.as_ref(),
        }
    }

    pub fn token(&self) -> Option<&SecretString> {
        self.token_at(Utc::now())
    }

    /// Token or `Unauthenticated`, checked before any request is built.
    pub fn require_token(&self) -> Result<SecretString, GiziCareError> {
        self.token().cloned().ok_or(GiziCareError::Unauthenticated)
    }

    pub fn is_signed_in(&self) -> bool {
        self.token().is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Serialize, Deserialize, Default)]
struct StoredSession {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    remember: bool,
    #[serde(default)]
    selected_profile_id: Option<u64>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl From<&Session> for StoredSession {
    fn from(s: &Session) -> Self {
        Self {
            token: s.token.as_ref().map(|t| t.expose_secret().to_string()),
            remember: s.remember,
            selected_profile_id: s.selected_profile_id,
            expires_at: s.expires_at,
        }
    }
}

impl From<StoredSession> for Session {
    fn from(s: StoredSession) -> Self {
        Self {
            token: s.token.filter(|t| !t.is_empty()).map(SecretString::from),
            remember: s.remember,
            selected_profile_id: s.selected_profile_id,
            expires_at: s.expires_at,
        }
    }
}

fn storage_err(path: &Path, err: impl std::fmt::Display) -> GiziCareError {
    GiziCareError::Storage(format!("{}: {}", path.display(), err))
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), GiziCareError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| storage_err(parent, e))?;
    }
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| storage_err(path, e))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| storage_err(path, e))
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, GiziCareError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(storage_err(path, e)),
    }
}

async fn remove_optional(path: &Path) -> Result<(), GiziCareError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(storage_err(path, e)),
    }
}

/// File-backed session, the cookie analogue.
#[derive(Clone, Debug)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or corrupt files load as a signed-out session.
    pub async fn load(&self) -> Result<Session, GiziCareError> {
        let Some(bytes) = read_optional(&self.path).await? else {
            return Ok(Session::default());
        };
        match serde_json::from_slice::<StoredSession>(&bytes) {
            Ok(stored) => Ok(stored.into()),
            Err(e) => {
                tracing::warn!("ignoring unreadable session file {}: {}", self.path.display(), e);
                Ok(Session::default())
            }
        }
    }

    pub async fn save(&self, session: &Session) -> Result<(), GiziCareError> {
        write_json(&self.path, &StoredSession::from(session)).await
    }

    pub async fn clear(&self) -> Result<(), GiziCareError> {
        remove_optional(&self.path).await
    }
}

/// One-shot slot for detection results awaiting import.
#[derive(Clone, Debug)]
pub struct HandoffStore {
    path: PathBuf,
}

impl HandoffStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Replace the staged items.
    pub async fn put(&self, items: &[HandoffItem]) -> Result<(), GiziCareError> {
        write_json(&self.path, &items).await
    }

    pub async fn peek(&self) -> Result<Vec<HandoffItem>, GiziCareError> {
        let Some(bytes) = read_optional(&self.path).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_slice(&bytes).map_err(|e| GiziCareError::Decode {
            what: "detection hand-off".into(),
            message: e.to_string(),
        })
    }

    /// Read and remove the staged items. An unreadable slot is discarded.
    pub async fn take(&self) -> Result<Vec<HandoffItem>, GiziCareError> {
        let items = match self.peek().await {
            Ok(items) => items,
            Err(GiziCareError::Decode { message, .. }) => {
                tracing::warn!("discarding unreadable hand-off: {}", message);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        remove_optional(&self.path).await?;
        Ok(items)
    }
}

/// Loading flag that refuses a second submit while one is pending.
#[derive(Debug, Default)]
pub struct SubmitGuard {
    busy: AtomicBool,
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` if a submit is already in flight.
    pub fn begin(&self) -> Option<SubmitTicket<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitTicket { guard: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Clears the loading flag on drop.
#[derive(Debug)]
pub struct SubmitTicket<'a> {
    guard: &'a SubmitGuard,
}

impl Drop for SubmitTicket<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}
