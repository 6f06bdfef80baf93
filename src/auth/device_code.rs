//! OAuth2 device authorization grant as an explicit state machine.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use strum::Display;
use tokio_util::sync::CancellationToken;

use super::oauth::{OAuthClient, TokenPoll};
use super::token::TokenStore;
use crate::error::{Result, TadoError};
use crate::util::clock::Clock;

/// Minimum spacing between two requests of one session.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Lifetime of a session, counted from `start()`.
pub const FLOW_DEADLINE: Duration = Duration::from_secs(5 * 60);

/// Lifecycle of a device authorization attempt.
///
/// Status only moves forward:
/// `NotStarted → Pending → {Completed | Expired | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceFlowStatus {
    NotStarted,
    Pending,
    Completed,
    Expired,
    Failed,
}

impl DeviceFlowStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Expired | Self::Failed)
    }
}

#[derive(Debug, Clone)]
struct Grant {
    device_code: String,
    user_code: String,
    verification_url: Option<String>,
    expires_at: DateTime<Utc>,
}

/// One device-flow attempt.
///
/// The session never sleeps on its own inside [`poll_once`](Self::poll_once);
/// polling too early is reported as [`TadoError::RateLimited`] and waiting is
/// left to the caller or to [`run_until_complete`](Self::run_until_complete).
pub struct DeviceAuthSession {
    oauth: Arc<OAuthClient>,
    tokens: Arc<TokenStore>,
    clock: Arc<dyn Clock>,
    status: DeviceFlowStatus,
    grant: Option<Grant>,
    last_request_at: Option<DateTime<Utc>>,
    failure: Option<String>,
}

impl std::fmt::Debug for DeviceAuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceAuthSession")
            .field("status", &self.status)
            .field("expires_at", &self.expires_at())
            .field("last_request_at", &self.last_request_at)
            .finish()
    }
}

impl DeviceAuthSession {
    pub fn new(oauth: Arc<OAuthClient>, tokens: Arc<TokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            oauth,
            tokens,
            clock,
            status: DeviceFlowStatus::NotStarted,
            grant: None,
            last_request_at: None,
            failure: None,
        }
    }

    pub fn status(&self) -> DeviceFlowStatus {
        self.status
    }

    pub fn interval(&self) -> Duration {
        POLL_INTERVAL
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.grant.as_ref().map(|grant| grant.expires_at)
    }

    /// Why the session ended in `Failed`, if it did.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn token_store(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Request a device code. Only valid before the first call.
    pub async fn start(&mut self) -> Result<DeviceFlowStatus> {
        if self.status != DeviceFlowStatus::NotStarted {
            return Err(TadoError::AuthFlow(format!(
                "device flow already started (status {})",
                self.status
            )));
        }

        let authorization = self.oauth.device_authorize().await?;
        let now = self.clock.now();
        let verification_url = authorization.verification_uri_complete.unwrap_or_else(|| {
            let mut url = authorization.verification_uri.clone();
            url.push_str(if url.contains('?') { "&" } else { "?" });
            url.push_str("user_code=");
            url.push_str(&authorization.user_code);
            url
        });

        self.grant = Some(Grant {
            device_code: authorization.device_code,
            user_code: authorization.user_code,
            verification_url: Some(verification_url.clone()),
            expires_at: now + to_chrono(FLOW_DEADLINE),
        });
        self.last_request_at = Some(now);
        self.status = DeviceFlowStatus::Pending;

        tracing::info!(url = %verification_url, "Visit the URL to authorize this device");
        Ok(self.status)
    }

    /// Check once whether the user approved the device.
    pub async fn poll_once(&mut self) -> Result<DeviceFlowStatus> {
        if self.status != DeviceFlowStatus::Pending {
            return Err(TadoError::InvalidState(format!(
                "poll_once requires PENDING, status is {}",
                self.status
            )));
        }
        let (device_code, expires_at) = match &self.grant {
            Some(grant) => (grant.device_code.clone(), grant.expires_at),
            None => {
                return Err(TadoError::InvalidState(
                    "pending session has no device code".to_string(),
                ))
            }
        };

        let now = self.clock.now();
        if now >= expires_at {
            tracing::info!("Device flow deadline passed");
            self.status = DeviceFlowStatus::Expired;
            return Ok(self.status);
        }
        if let Some(wait) = self.remaining_wait(now) {
            return Err(TadoError::RateLimited {
                retry_after_ms: Some(wait.as_millis() as u64),
            });
        }

        self.last_request_at = Some(now);
        let poll = self.oauth.poll_device_token(&device_code).await?;

        // An answer that arrives after the deadline does not count.
        if self.clock.now() >= expires_at {
            self.status = DeviceFlowStatus::Expired;
            return Ok(self.status);
        }

        match poll {
            TokenPoll::Pending | TokenPoll::SlowDown => {
                tracing::debug!("Device authorization still pending");
            }
            TokenPoll::Expired => {
                self.status = DeviceFlowStatus::Expired;
            }
            TokenPoll::Denied(reason) => {
                tracing::warn!(reason = %reason, "Device authorization failed");
                self.failure = Some(reason);
                self.status = DeviceFlowStatus::Failed;
            }
            TokenPoll::Authorized(token) => {
                self.status = DeviceFlowStatus::Completed;
                if let Some(grant) = self.grant.as_mut() {
                    grant.verification_url = None;
                }
                tracing::info!("Device authorization completed");
                // A sink failure is recorded, not returned; the tokens stay usable.
                if let Err(err) = self.tokens.replace(token) {
                    tracing::warn!(error = %err, "Device flow tokens could not be persisted");
                }
            }
        }
        Ok(self.status)
    }

    /// Poll at the allowed pace until a terminal status.
    ///
    /// Cancelling returns [`TadoError::Cancelled`] and keeps the session as
    /// it was, so it can be resumed before the deadline.
    pub async fn run_until_complete(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<DeviceFlowStatus> {
        if self.status == DeviceFlowStatus::NotStarted {
            self.start().await?;
        }
        while self.status == DeviceFlowStatus::Pending {
            if cancel.is_cancelled() {
                return Err(TadoError::Cancelled);
            }
            let now = self.clock.now();
            let until_deadline = self
                .expires_at()
                .map(|deadline| (deadline - now).to_std().unwrap_or(Duration::ZERO))
                .unwrap_or(Duration::ZERO);
            let wait = self.remaining_wait(now).unwrap_or(Duration::ZERO).min(until_deadline);
            if !wait.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(TadoError::Cancelled),
                    _ = self.clock.sleep(wait) => {}
                }
            }
            self.poll_once().await?;
        }
        Ok(self.status)
    }

    /// `Some(url)` while pending, `None` once completed.
    pub fn verification_url(&self) -> Result<Option<&str>> {
        match self.status {
            DeviceFlowStatus::Pending => Ok(self
                .grant
                .as_ref()
                .and_then(|grant| grant.verification_url.as_deref())),
            DeviceFlowStatus::Completed => Ok(None),
            status => Err(TadoError::InvalidState(format!(
                "no verification URL in status {status}"
            ))),
        }
    }

    pub fn user_code(&self) -> Result<&str> {
        match (&self.status, &self.grant) {
            (DeviceFlowStatus::Pending, Some(grant)) => Ok(grant.user_code.as_str()),
            (status, _) => Err(TadoError::InvalidState(format!(
                "no user code in status {status}"
            ))),
        }
    }

    fn remaining_wait(&self, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.last_request_at?;
        let next = last + to_chrono(POLL_INTERVAL);
        if now >= next {
            None
        } else {
            (next - now).to_std().ok()
        }
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero())
}
