//! Client configuration (layered: code > env > defaults).

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bon::Builder;

use crate::http::HttpTransport;
use crate::util::clock::Clock;
use crate::util::retry::RetryPolicy;

/// Public OAuth client id of the tado web app.
pub const DEFAULT_CLIENT_ID: &str = "1bb50063-6b0c-4d11-bd99-387f4a91cc46";

pub const DEFAULT_USER_AGENT: &str = concat!("tado-client/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Base URLs of the vendor services.
///
/// Every URL ends with a slash so relative paths join underneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Classic API (`my.tado.com/api/v2/`), also used for probing.
    pub my_api: String,
    /// X generation API (`hops.tado.com/`).
    pub hops_api: String,
    /// OAuth service (`login.tado.com/oauth2/`).
    pub login: String,
    /// Statistics service (`minder.tado.com/v1/`).
    pub minder: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            my_api: "https://my.tado.com/api/v2/".to_string(),
            hops_api: "https://hops.tado.com/".to_string(),
            login: "https://login.tado.com/oauth2/".to_string(),
            minder: "https://minder.tado.com/v1/".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every service at one base URL, e.g. a mock server.
    ///
    /// Paths become `{base}/api/v2/`, `{base}/hops/`, `{base}/oauth2/` and
    /// `{base}/minder/`.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            my_api: format!("{base}/api/v2/"),
            hops_api: format!("{base}/hops/"),
            login: format!("{base}/oauth2/"),
            minder: format!("{base}/minder/"),
        }
    }
}

/// Construction options for [`crate::client::ClientInitializer`].
///
/// ```
/// use std::time::Duration;
/// use tado_client::config::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .debug(true)
///     .request_timeout(Duration::from_secs(5))
///     .build();
/// assert!(config.debug);
/// ```
#[derive(Clone, Builder)]
pub struct ClientConfig {
    /// Log request and response bodies at debug level.
    #[builder(default)]
    pub debug: bool,
    /// Refresh token to resume from. Takes precedence over the token file.
    #[builder(into)]
    pub saved_refresh_token: Option<String>,
    /// Where the refresh token is persisted. `None` keeps tokens in memory.
    #[builder(into)]
    pub token_file_path: Option<PathBuf>,
    /// Injected transport. Defaults to a shared reqwest client.
    pub http_session: Option<Arc<dyn HttpTransport>>,
    /// Injected clock. Defaults to system time.
    pub clock: Option<Arc<dyn Clock>>,
    #[builder(default)]
    pub endpoints: Endpoints,
    #[builder(into, default = DEFAULT_CLIENT_ID.to_string())]
    pub client_id: String,
    #[builder(into, default = DEFAULT_USER_AGENT.to_string())]
    pub user_agent: String,
    /// Bound for every outbound call.
    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,
    /// Retry policy for idempotent reads.
    #[builder(default)]
    pub retry: RetryPolicy,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("debug", &self.debug)
            .field(
                "saved_refresh_token",
                &self.saved_refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("token_file_path", &self.token_file_path)
            .field("http_session", &self.http_session.as_ref().map(|_| ".."))
            .field("clock", &self.clock)
            .field("endpoints", &self.endpoints)
            .field("client_id", &self.client_id)
            .field("user_agent", &self.user_agent)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientConfig {
    /// Load from environment variables.
    ///
    /// Reads `TADO_REFRESH_TOKEN`, `TADO_TOKEN_FILE`, `TADO_DEBUG` and
    /// `TADO_USER_AGENT` after loading a `.env` file if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();

        if let Ok(token) = std::env::var("TADO_REFRESH_TOKEN") {
            if !token.trim().is_empty() {
                config.saved_refresh_token = Some(token.trim().to_string());
            }
        }
        if let Ok(path) = std::env::var("TADO_TOKEN_FILE") {
            if !path.trim().is_empty() {
                config.token_file_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(debug) = std::env::var("TADO_DEBUG") {
            config.debug = parse_flag(&debug);
        }
        if let Ok(agent) = std::env::var("TADO_USER_AGENT") {
            if !agent.trim().is_empty() {
                config.user_agent = agent;
            }
        }

        config
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
