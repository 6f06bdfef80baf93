//! Error classification and recovery hints.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The operation is not valid in the current device-flow or client state.
    FlowState,
    /// A deadline or time budget was exceeded.
    Expiry,
    /// Credentials are missing, rejected or rotated away.
    Authentication,
    /// The vendor answered with something this client does not understand.
    Upstream,
    RateLimit,
    Network,
    Server,
    Persistence,
    Configuration,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    WaitForPollInterval,
    RestartDeviceFlow,
    IncreaseTimeout,
    CheckConfiguration,
    CheckTokenStorage,
    ReportUpstreamChange,
    ContactSupport,
}
