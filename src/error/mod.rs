//! Error types for the tado client.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all client operations.
#[derive(Error, Debug)]
pub enum TadoError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The device flow was asked to do something its current status forbids.
    #[error("Device flow error: {0}")]
    AuthFlow(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Operation cancelled")]
    Cancelled,

    /// The refresh token was rejected or a request still failed with fresh
    /// credentials. A new device flow is required.
    #[error("Reauthentication required: {0}")]
    ReauthenticationRequired(String),

    #[error("Unexpected response for {context}: {message}")]
    UpstreamSchema { context: String, message: String },

    #[error("Unknown home configuration: {0}")]
    UnknownHomeConfiguration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    /// Tokens were updated in memory but could not be written to the sink.
    #[error("Token persistence failed: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl TadoError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn upstream_schema(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamSchema {
            context: context.into(),
            message: message.into(),
        }
    }

    /// An equivalent error value.
    ///
    /// IO and serialization errors cannot be cloned; their copies keep the
    /// kind and message.
    pub(crate) fn duplicate(&self) -> Self {
        match self {
            Self::Configuration(m) => Self::Configuration(m.clone()),
            Self::AuthFlow(m) => Self::AuthFlow(m.clone()),
            Self::InvalidState(m) => Self::InvalidState(m.clone()),
            Self::RateLimited { retry_after_ms } => Self::RateLimited {
                retry_after_ms: *retry_after_ms,
            },
            Self::Timeout(ms) => Self::Timeout(*ms),
            Self::Cancelled => Self::Cancelled,
            Self::ReauthenticationRequired(m) => Self::ReauthenticationRequired(m.clone()),
            Self::UpstreamSchema { context, message } => Self::UpstreamSchema {
                context: context.clone(),
                message: message.clone(),
            },
            Self::UnknownHomeConfiguration(m) => Self::UnknownHomeConfiguration(m.clone()),
            Self::NotFound(m) => Self::NotFound(m.clone()),
            Self::Api { status, message } => Self::Api {
                status: *status,
                message: message.clone(),
            },
            Self::Network(m) => Self::Network(m.clone()),
            Self::Persistence(m) => Self::Persistence(m.clone()),
            Self::Io(err) => Self::Io(std::io::Error::new(err.kind(), err.to_string())),
            Self::Serialization(err) => Self::upstream_schema("response", err.to_string()),
            Self::InvalidArgument(m) => Self::InvalidArgument(m.clone()),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthFlow(_) | Self::InvalidState(_) | Self::InvalidArgument(_) => {
                ErrorCategory::FlowState
            }
            Self::Timeout(_) | Self::Cancelled => ErrorCategory::Expiry,
            Self::ReauthenticationRequired(_) => ErrorCategory::Authentication,
            Self::UpstreamSchema { .. }
            | Self::UnknownHomeConfiguration(_)
            | Self::NotFound(_)
            | Self::Serialization(_) => ErrorCategory::Upstream,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Persistence(_) | Self::Io(_) => ErrorCategory::Persistence,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Unknown,
            },
        }
    }

    /// Whether a bounded retry of an idempotent read may succeed.
    ///
    /// Only gateway failures count as server errors worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            Self::RateLimited { .. } => RecoverySuggestion::WaitForPollInterval,
            Self::ReauthenticationRequired(_) => RecoverySuggestion::RestartDeviceFlow,
            Self::Timeout(_) => RecoverySuggestion::IncreaseTimeout,
            _ => match self.category() {
                ErrorCategory::Network | ErrorCategory::Server => {
                    RecoverySuggestion::RetryWithBackoff
                }
                ErrorCategory::Upstream => RecoverySuggestion::ReportUpstreamChange,
                ErrorCategory::Persistence => RecoverySuggestion::CheckTokenStorage,
                ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
                ErrorCategory::Authentication => RecoverySuggestion::RestartDeviceFlow,
                _ => RecoverySuggestion::ContactSupport,
            },
        }
    }
}

impl From<reqwest::Error> for TadoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout(0);
        }
        Self::Network(err.to_string())
    }
}

impl From<url::ParseError> for TadoError {
    fn from(err: url::ParseError) -> Self {
        Self::Configuration(format!("invalid URL: {err}"))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TadoError>;
