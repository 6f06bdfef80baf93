//! Tests for client configuration.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use tado_client::config::{ClientConfig, Endpoints, DEFAULT_CLIENT_ID, DEFAULT_USER_AGENT};
use tado_client::util::retry::RetryPolicy;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 4] = [
    "TADO_REFRESH_TOKEN",
    "TADO_TOKEN_FILE",
    "TADO_DEBUG",
    "TADO_USER_AGENT",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn clear_config_env() {
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }
}

#[test]
fn from_env_reads_tado_variables() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    clear_config_env();

    std::env::set_var("TADO_REFRESH_TOKEN", "  refresh-from-env  ");
    std::env::set_var("TADO_TOKEN_FILE", "/tmp/tado/token.json");
    std::env::set_var("TADO_DEBUG", "yes");
    std::env::set_var("TADO_USER_AGENT", "home-automation/1.0");

    let config = ClientConfig::from_env();
    assert_eq!(config.saved_refresh_token.as_deref(), Some("refresh-from-env"));
    assert_eq!(
        config.token_file_path,
        Some(PathBuf::from("/tmp/tado/token.json"))
    );
    assert!(config.debug);
    assert_eq!(config.user_agent, "home-automation/1.0");
}

#[test]
fn from_env_ignores_blank_values() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    clear_config_env();

    std::env::set_var("TADO_REFRESH_TOKEN", "   ");
    std::env::set_var("TADO_TOKEN_FILE", "");
    std::env::set_var("TADO_DEBUG", "off");

    let config = ClientConfig::from_env();
    assert!(config.saved_refresh_token.is_none());
    assert!(config.token_file_path.is_none());
    assert!(!config.debug);
    assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
}

#[test]
fn defaults_match_vendor_client() {
    let config = ClientConfig::default();
    assert_eq!(config.client_id, DEFAULT_CLIENT_ID);
    assert_eq!(config.endpoints, Endpoints::default());
    assert_eq!(config.endpoints.login, "https://login.tado.com/oauth2/");
    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert!(config.saved_refresh_token.is_none());
    assert!(config.http_session.is_none());
    assert!(config.clock.is_none());
}

#[test]
fn builder_overrides_defaults() {
    let config = ClientConfig::builder()
        .client_id("custom-client")
        .user_agent("custom-agent")
        .token_file_path("/var/lib/tado/token.json")
        .request_timeout(Duration::from_secs(3))
        .retry(RetryPolicy::none())
        .endpoints(Endpoints::with_base("http://localhost:8080"))
        .build();

    assert_eq!(config.client_id, "custom-client");
    assert_eq!(config.user_agent, "custom-agent");
    assert_eq!(
        config.token_file_path.as_deref(),
        Some(std::path::Path::new("/var/lib/tado/token.json"))
    );
    assert_eq!(config.request_timeout, Duration::from_secs(3));
    assert_eq!(config.retry.max_attempts, 1);
    assert_eq!(config.endpoints.my_api, "http://localhost:8080/api/v2/");
}

#[test]
fn debug_output_never_shows_refresh_token() {
    let config = ClientConfig::builder()
        .saved_refresh_token("very-secret-refresh")
        .build();
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("very-secret-refresh"));
    assert!(rendered.contains("saved_refresh_token"));
}
