//! Utility modules: retry, timeout, clock.

pub mod clock;
pub mod retry;
pub mod timeout;
