//! Calls against the vendor's OAuth service.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::Deserialize;
use url::Url;

use super::token::Token;
use crate::config::ClientConfig;
use crate::error::{Result, TadoError};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::util::clock::Clock;
use crate::util::timeout::with_timeout;

const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
const SCOPE: &str = "offline_access";
pub(crate) const REFERER: &str = "https://app.tado.com/";

/// Answer of the device authorization endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    #[serde(default)]
    pub verification_uri_complete: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub interval: Option<u64>,
}

/// Outcome of one device-token poll.
#[derive(Debug, Clone)]
pub enum TokenPoll {
    Authorized(Token),
    Pending,
    SlowDown,
    Expired,
    Denied(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OAuthErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client for `device_authorize` and `token`.
pub struct OAuthClient {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    login_base: String,
    client_id: String,
    user_agent: String,
    timeout: Duration,
}

impl OAuthClient {
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            clock,
            login_base: config.endpoints.login.clone(),
            client_id: config.client_id.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.request_timeout,
        }
    }

    pub async fn device_authorize(&self) -> Result<DeviceAuthorization> {
        let url = self.url(
            "device_authorize",
            &[("client_id", self.client_id.as_str()), ("scope", SCOPE)],
        )?;
        let response = self.post(url).await?;
        if !response.is_success() {
            return Err(TadoError::AuthFlow(format!(
                "Device authorization failed with status {}: {}",
                response.status,
                describe_error(&response)
            )));
        }
        serde_json::from_str(&response.body)
            .map_err(|e| TadoError::upstream_schema("device authorization", e.to_string()))
    }

    pub async fn poll_device_token(&self, device_code: &str) -> Result<TokenPoll> {
        let url = self.url(
            "token",
            &[
                ("client_id", self.client_id.as_str()),
                ("device_code", device_code),
                ("grant_type", DEVICE_GRANT_TYPE),
            ],
        )?;
        let response = self.post(url).await?;
        if response.is_success() {
            return self.token_from(&response, None).map(TokenPoll::Authorized);
        }
        if !matches!(response.status, 400 | 401 | 403) {
            return Err(TadoError::api(response.status, response.body));
        }

        let payload: OAuthErrorResponse = serde_json::from_str(&response.body).unwrap_or_default();
        match payload.error.as_deref() {
            Some("authorization_pending") => Ok(TokenPoll::Pending),
            Some("slow_down") => Ok(TokenPoll::SlowDown),
            Some("expired_token") => Ok(TokenPoll::Expired),
            Some("access_denied") => Ok(TokenPoll::Denied("access_denied".to_string())),
            Some(other) => Ok(TokenPoll::Denied(other.to_string())),
            None => Ok(TokenPoll::Denied(format!("status {}", response.status))),
        }
    }

    /// Exchange a refresh token. Rejection means the grant is gone.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Token> {
        let url = self.url(
            "token",
            &[
                ("client_id", self.client_id.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ],
        )?;
        let response = self.post(url).await?;
        if response.is_success() {
            return self.token_from(&response, Some(refresh_token));
        }
        match response.status {
            400 | 401 | 403 => Err(TadoError::ReauthenticationRequired(format!(
                "refresh token rejected: {}",
                describe_error(&response)
            ))),
            429 => Err(TadoError::RateLimited {
                retry_after_ms: response.retry_after_ms(),
            }),
            status => Err(TadoError::api(status, response.body)),
        }
    }

    fn token_from(&self, response: &HttpResponse, previous_refresh: Option<&str>) -> Result<Token> {
        let payload: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|e| TadoError::upstream_schema("token response", e.to_string()))?;
        let expires_at = payload
            .expires_in
            .map(|secs| self.clock.now() + chrono::Duration::seconds(secs));
        Ok(Token {
            access_token: payload.access_token,
            refresh_token: payload
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            expires_at,
            scopes: payload
                .scope
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        })
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&self.login_base)?.join(path)?;
        url.query_pairs_mut().extend_pairs(params.iter());
        Ok(url)
    }

    async fn post(&self, url: Url) -> Result<HttpResponse> {
        tracing::debug!(path = url.path(), "POST oauth");
        let request = HttpRequest::new(Method::POST, url)
            .header("Referer", REFERER)
            .header("User-Agent", self.user_agent.as_str());
        with_timeout(self.timeout, self.transport.send(request)).await
    }
}

fn describe_error(response: &HttpResponse) -> String {
    let payload: OAuthErrorResponse = serde_json::from_str(&response.body).unwrap_or_default();
    match (payload.error, payload.error_description) {
        (Some(error), Some(description)) => format!("{error} ({description})"),
        (Some(error), None) => error,
        _ => format!("status {}", response.status),
    }
}
