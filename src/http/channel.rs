//! Authorized request channel shared by both backends.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::request::ApiRequest;
use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::auth::oauth::REFERER;
use crate::auth::{OAuthClient, TokenStore};
use crate::config::{ClientConfig, Endpoints};
use crate::error::{Result, TadoError};
use crate::models::decode;
use crate::util::clock::Clock;
use crate::util::retry::RetryPolicy;
use crate::util::timeout::with_timeout;

/// Sends [`ApiRequest`]s with a valid bearer token.
///
/// - refreshes proactively when the access token is about to expire;
/// - on a 401, refreshes once (coalesced across concurrent callers) and
///   resends; a second 401 is [`TadoError::ReauthenticationRequired`];
/// - bounds every exchange with the configured timeout;
/// - retries idempotent reads on gateway and network failures only.
pub struct ApiChannel {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<TokenStore>,
    oauth: Arc<OAuthClient>,
    clock: Arc<dyn Clock>,
    endpoints: Endpoints,
    user_agent: String,
    debug: bool,
    timeout: Duration,
    retry: RetryPolicy,
    home_id: OnceLock<u64>,
}

impl std::fmt::Debug for ApiChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiChannel")
            .field("endpoints", &self.endpoints)
            .field("home_id", &self.home_id.get())
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiChannel {
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<TokenStore>,
        oauth: Arc<OAuthClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            tokens,
            oauth,
            clock,
            endpoints: config.endpoints.clone(),
            user_agent: config.user_agent.clone(),
            debug: config.debug,
            timeout: config.request_timeout,
            retry: config.retry.clone(),
            home_id: OnceLock::new(),
        }
    }

    pub fn home_id(&self) -> Option<u64> {
        self.home_id.get().copied()
    }

    /// Bind the channel to a home. The first binding wins.
    pub fn set_home_id(&self, home_id: u64) -> Result<()> {
        match self.home_id.get() {
            Some(existing) if *existing != home_id => Err(TadoError::InvalidState(format!(
                "channel already bound to home {existing}"
            ))),
            Some(_) => Ok(()),
            None => {
                let _ = self.home_id.set(home_id);
                Ok(())
            }
        }
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Send and return the parsed JSON body (`Null` when empty).
    pub async fn request(&self, request: &ApiRequest) -> Result<Value> {
        if request.is_idempotent() {
            self.retry.execute(|| self.send_authorized(request)).await
        } else {
            self.send_authorized(request).await
        }
    }

    /// Send and decode the body into `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, context: &str, request: &ApiRequest) -> Result<T> {
        decode(context, self.request(request).await?)
    }

    /// Send and discard the body.
    pub async fn execute(&self, request: &ApiRequest) -> Result<()> {
        self.request(request).await.map(|_| ())
    }

    /// Refresh unconditionally, e.g. when resuming from a stored refresh token.
    pub async fn force_refresh(&self) -> Result<()> {
        self.refresh_after(self.tokens.generation()).await
    }

    async fn send_authorized(&self, request: &ApiRequest) -> Result<Value> {
        let (access_token, generation) = self.fresh_access_token().await?;
        let mut response = self.send_once(request, &access_token).await?;

        if response.status == 401 {
            tracing::debug!(command = %request.command, "Access token rejected, refreshing");
            self.refresh_after(generation).await?;
            let (access_token, _) = self.current_access_token()?;
            response = self.send_once(request, &access_token).await?;
            if response.status == 401 {
                return Err(TadoError::ReauthenticationRequired(
                    "request rejected with a freshly refreshed token".to_string(),
                ));
            }
        }

        self.interpret(request, response)
    }

    async fn fresh_access_token(&self) -> Result<(String, u64)> {
        if self.tokens.needs_refresh(self.clock.now()) {
            self.refresh_after(self.tokens.generation()).await?;
        }
        self.current_access_token()
    }

    fn current_access_token(&self) -> Result<(String, u64)> {
        self.tokens.access_token().ok_or_else(|| {
            TadoError::ReauthenticationRequired("no access token available".to_string())
        })
    }

    async fn refresh_after(&self, generation: u64) -> Result<()> {
        let oauth = &self.oauth;
        self.tokens
            .refresh_coalesced(generation, |refresh_token| async move {
                oauth.refresh(&refresh_token).await
            })
            .await
            .map(|_| ())
    }

    async fn send_once(&self, request: &ApiRequest, access_token: &str) -> Result<HttpResponse> {
        let url = request.url(&self.endpoints, self.home_id())?;
        let method = request.method();

        let mut http = HttpRequest::new(method.clone(), url.clone())
            .header("Authorization", format!("Bearer {access_token}"))
            .header("Referer", REFERER)
            .header("User-Agent", self.user_agent.as_str());
        if let Some(payload) = &request.payload {
            http = http.json(payload.clone());
        }

        if self.debug {
            tracing::debug!(%method, %url, payload = ?request.payload, "tado request");
        }
        let response = with_timeout(self.timeout, self.transport.send(http)).await?;
        tracing::debug!(%method, path = url.path(), status = response.status, "tado response");
        if self.debug {
            tracing::debug!(body = %response.body, "tado response body");
        }
        Ok(response)
    }

    fn interpret(&self, request: &ApiRequest, response: HttpResponse) -> Result<Value> {
        if response.is_success() {
            return response
                .json()
                .map_err(|e| TadoError::upstream_schema(request.command.clone(), e.to_string()));
        }
        let path = request
            .path(self.home_id())
            .unwrap_or_else(|_| request.command.clone());
        match response.status {
            404 => Err(TadoError::NotFound(path)),
            429 => Err(TadoError::RateLimited {
                retry_after_ms: response.retry_after_ms(),
            }),
            status => Err(TadoError::api(status, error_message(&response))),
        }
    }
}

fn error_message(response: &HttpResponse) -> String {
    // {"errors":[{"code":"...","title":"..."}]}
    response
        .json()
        .ok()
        .and_then(|body| {
            body.get("errors")
                .and_then(Value::as_array)
                .and_then(|errors| errors.first())
                .and_then(|first| first.get("title").or_else(|| first.get("code")))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| response.body.clone())
}
