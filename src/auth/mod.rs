//! OAuth device flow, token refresh and token persistence.

pub mod device_code;
pub mod oauth;
pub mod store;
pub mod token;

pub use device_code::{DeviceAuthSession, DeviceFlowStatus, FLOW_DEADLINE, POLL_INTERVAL};
pub use oauth::{DeviceAuthorization, OAuthClient, TokenPoll};
pub use store::{FileTokenSink, MemoryTokenSink, TokenSink};
pub use token::{Token, TokenStore, REFRESH_MARGIN};
