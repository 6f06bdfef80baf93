//! Token values and the shared in-memory token store.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store::TokenSink;
use crate::error::{Result, TadoError};

/// Refresh this long before the access token actually expires.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// OAuth token set.
///
/// # Example
/// ```
/// use tado_client::auth::Token;
///
/// let token = Token::from_refresh_token("refresh");
/// assert!(token.access_token.is_empty());
/// assert!(token.is_resumable());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl Token {
    /// A token set that only carries a refresh token; the access token is
    /// obtained on first use.
    pub fn from_refresh_token(refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: String::new(),
            refresh_token: Some(refresh_token.into()),
            expires_at: None,
            scopes: Vec::new(),
        }
    }

    pub fn is_resumable(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    /// True when the access token is missing or expires within `margin`.
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        if self.access_token.is_empty() {
            return true;
        }
        let margin = chrono::Duration::from_std(margin).unwrap_or(chrono::Duration::zero());
        match self.expires_at {
            Some(expires_at) => expires_at - margin <= now,
            None => false,
        }
    }
}

/// Shared owner of the current token set.
///
/// Every authorizing component holds an `Arc<TokenStore>`. Mutations bump a
/// generation counter; [`TokenStore::refresh_coalesced`] uses it so that
/// callers who all saw the same stale token trigger exactly one refresh,
/// whether that refresh succeeds or fails.
pub struct TokenStore {
    current: RwLock<Option<Token>>,
    generation: AtomicU64,
    refresh_gate: tokio::sync::Mutex<()>,
    failed_refreshes: AtomicU64,
    last_failure: Mutex<Option<FailedRefresh>>,
    sink: Option<Arc<dyn TokenSink>>,
    last_persistence_error: Mutex<Option<String>>,
}

/// Outcome of the most recent failed refresh, handed to the callers that
/// were queued behind it.
struct FailedRefresh {
    generation: u64,
    error: TadoError,
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("generation", &self.generation())
            .field("resumable", &self.is_resumable())
            .field("sink", &self.sink.as_ref().map(|_| ".."))
            .finish()
    }
}

impl TokenStore {
    /// An empty store.
    pub fn new(sink: Option<Arc<dyn TokenSink>>) -> Self {
        Self {
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
            refresh_gate: tokio::sync::Mutex::new(()),
            failed_refreshes: AtomicU64::new(0),
            last_failure: Mutex::new(None),
            sink,
            last_persistence_error: Mutex::new(None),
        }
    }

    /// A store seeded with `token`. Seeding is not persisted.
    pub fn with_token(token: Token, sink: Option<Arc<dyn TokenSink>>) -> Self {
        let store = Self::new(sink);
        *store.write_slot() = Some(token);
        store
    }

    pub fn snapshot(&self) -> Option<Token> {
        self.read_slot().clone()
    }

    /// Incremented on every successful replacement.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn is_resumable(&self) -> bool {
        self.read_slot().as_ref().is_some_and(Token::is_resumable)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read_slot()
            .as_ref()
            .and_then(|token| token.refresh_token.clone())
    }

    /// The access token together with the generation it belongs to.
    ///
    /// Both are read under one lock, so the pair is never torn by a
    /// concurrent [`TokenStore::replace`].
    pub fn access_token(&self) -> Option<(String, u64)> {
        let slot = self.read_slot();
        let generation = self.generation();
        slot.as_ref()
            .filter(|token| !token.access_token.is_empty())
            .map(|token| (token.access_token.clone(), generation))
    }

    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.read_slot()
            .as_ref()
            .map_or(true, |token| token.needs_refresh(now, REFRESH_MARGIN))
    }

    /// Replace the token set and persist its refresh token.
    ///
    /// The in-memory replacement always happens. A sink failure is returned
    /// as [`TadoError::Persistence`] and remembered for
    /// [`TokenStore::take_persistence_error`].
    pub fn replace(&self, token: Token) -> Result<()> {
        let refresh_token = token.refresh_token.clone();
        {
            let mut slot = self.write_slot();
            *slot = Some(token);
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        self.persist(refresh_token.as_deref())
    }

    /// Drop the tokens from memory and from the sink.
    pub fn clear(&self) -> Result<()> {
        {
            let mut slot = self.write_slot();
            *slot = None;
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        match &self.sink {
            Some(sink) => sink.clear(),
            None => Ok(()),
        }
    }

    /// Run `refresh` unless another caller already replaced the token since
    /// `observed_generation`.
    ///
    /// At most one refresh runs at a time. Callers queued behind a
    /// successful refresh see the bumped generation and return without a
    /// second network call. Callers queued behind a failed one receive the
    /// same error. A rejected refresh token is dropped from memory, so later
    /// refreshes fail with [`TadoError::ReauthenticationRequired`] at once.
    /// Persistence failures are logged and recorded, not returned.
    pub async fn refresh_coalesced<F, Fut>(&self, observed_generation: u64, refresh: F) -> Result<u64>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Token>>,
    {
        let failures_seen = self.failed_refreshes.load(Ordering::Acquire);
        let _gate = self.refresh_gate.lock().await;
        let current = self.generation();
        if current != observed_generation {
            tracing::debug!(
                observed = observed_generation,
                current,
                "Token already refreshed by a concurrent caller"
            );
            return Ok(current);
        }
        if let Some(error) = self.failure_since(failures_seen, observed_generation) {
            tracing::debug!(
                observed = observed_generation,
                error = %error,
                "Sharing the failure of a concurrent refresh"
            );
            return Err(error);
        }

        let refresh_token = self.refresh_token().ok_or_else(|| {
            TadoError::ReauthenticationRequired("no refresh token available".to_string())
        })?;
        let token = match refresh(refresh_token).await {
            Ok(token) => token,
            Err(error) => {
                self.record_failure(observed_generation, &error);
                return Err(error);
            }
        };
        if let Err(err) = self.replace(token) {
            tracing::warn!(error = %err, "Refreshed token could not be persisted");
        }
        tracing::debug!(generation = self.generation(), "Access token refreshed");
        Ok(self.generation())
    }

    /// The most recent persistence failure, if any, clearing it.
    pub fn take_persistence_error(&self) -> Option<String> {
        self.last_persistence_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    /// The failure recorded after `failures_seen` for `generation`, if any.
    fn failure_since(&self, failures_seen: u64, generation: u64) -> Option<TadoError> {
        if self.failed_refreshes.load(Ordering::Acquire) == failures_seen {
            return None;
        }
        self.last_failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .filter(|failure| failure.generation == generation)
            .map(|failure| failure.error.duplicate())
    }

    fn record_failure(&self, generation: u64, error: &TadoError) {
        if matches!(error, TadoError::ReauthenticationRequired(_)) {
            tracing::warn!(error = %error, "Refresh token rejected, dropping it");
            if let Some(token) = self.write_slot().as_mut() {
                token.refresh_token = None;
            }
        }
        *self.last_failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(FailedRefresh {
            generation,
            error: error.duplicate(),
        });
        self.failed_refreshes.fetch_add(1, Ordering::AcqRel);
    }

    fn persist(&self, refresh_token: Option<&str>) -> Result<()> {
        let Some(sink) = &self.sink else {
            return Ok(());
        };
        let result = match refresh_token {
            Some(refresh_token) => sink.save(refresh_token),
            None => sink.clear(),
        };
        result.map_err(|err| {
            let message = err.to_string();
            *self
                .last_persistence_error
                .lock()
                .unwrap_or_else(|e| e.into_inner()) = Some(message.clone());
            TadoError::Persistence(message)
        })
    }

    fn read_slot(&self) -> std::sync::RwLockReadGuard<'_, Option<Token>> {
        self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_slot(&self) -> std::sync::RwLockWriteGuard<'_, Option<Token>> {
        self.current.write().unwrap_or_else(|e| e.into_inner())
    }
}
