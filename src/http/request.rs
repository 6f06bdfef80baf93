//! Vendor-relative API requests.

use reqwest::Method;
use serde_json::Value;
use strum::Display;
use url::Url;

use crate::config::Endpoints;
use crate::error::{Result, TadoError};

/// Which vendor service a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Endpoint {
    MyApi,
    HopsApi,
    /// Statistics service.
    Minder,
}

/// The resource a command is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Domain {
    /// `homes/{home_id}/{command}`
    Home,
    /// `me`
    Me,
    /// `devices/{device}/{command}`
    Devices,
    /// `homeByBridge/{bridge}/{command}`
    HomeByBridge,
}

/// Intent of a request, mapped to an HTTP method per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Action {
    Get,
    Set,
    Reset,
    Change,
}

/// A request described relative to the home, independent of host.
///
/// ```
/// use tado_client::http::{Action, ApiRequest};
/// use serde_json::json;
///
/// let request = ApiRequest::home("presenceLock")
///     .action(Action::Change)
///     .payload(json!({ "homePresence": "HOME" }));
/// assert_eq!(request.method().as_str(), "PUT");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub domain: Domain,
    pub action: Action,
    pub command: String,
    pub device: Option<String>,
    pub payload: Option<Value>,
    pub params: Vec<(String, String)>,
}

impl ApiRequest {
    /// A GET on `homes/{id}/{command}` of the classic API.
    pub fn home(command: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::MyApi,
            domain: Domain::Home,
            action: Action::Get,
            command: command.into(),
            device: None,
            payload: None,
            params: Vec::new(),
        }
    }

    /// A GET on `homes/{id}/{command}` of the X API.
    pub fn hops(command: impl Into<String>) -> Self {
        Self::home(command).endpoint(Endpoint::HopsApi)
    }

    /// `GET me` on the classic API.
    pub fn me() -> Self {
        Self {
            domain: Domain::Me,
            ..Self::home("")
        }
    }

    /// A GET on `devices/{device}/{command}` of the classic API.
    pub fn device(device: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            domain: Domain::Devices,
            device: Some(device.into()),
            ..Self::home(command)
        }
    }

    /// A GET on `homeByBridge/{bridge}/{command}` of the classic API.
    pub fn bridge(bridge: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            domain: Domain::HomeByBridge,
            device: Some(bridge.into()),
            ..Self::home(command)
        }
    }

    /// A GET on `homes/{id}/{command}` of the statistics service.
    pub fn minder(command: impl Into<String>) -> Self {
        Self::home(command).endpoint(Endpoint::Minder)
    }

    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// The X API updates resources with PATCH where the classic API uses PUT.
    pub fn method(&self) -> Method {
        match (self.action, self.endpoint) {
            (Action::Get, _) => Method::GET,
            (Action::Set, _) => Method::POST,
            (Action::Reset, _) => Method::DELETE,
            (Action::Change, Endpoint::HopsApi) => Method::PATCH,
            (Action::Change, _) => Method::PUT,
        }
    }

    /// Only reads are safe to repeat after a transient failure.
    pub fn is_idempotent(&self) -> bool {
        self.action == Action::Get
    }

    /// Relative path below the endpoint base.
    pub fn path(&self, home_id: Option<u64>) -> Result<String> {
        let command = self.command.trim_start_matches('/');
        let path = match self.domain {
            Domain::Me => "me".to_string(),
            Domain::Home => {
                let home_id = home_id.ok_or_else(|| {
                    TadoError::InvalidState(format!(
                        "home id is not resolved yet for '{command}'"
                    ))
                })?;
                if command.is_empty() {
                    format!("homes/{home_id}")
                } else {
                    format!("homes/{home_id}/{command}")
                }
            }
            Domain::Devices | Domain::HomeByBridge => {
                let prefix = if self.domain == Domain::Devices {
                    "devices"
                } else {
                    "homeByBridge"
                };
                let device = self.device.as_deref().ok_or_else(|| {
                    TadoError::InvalidArgument(format!("device id missing for '{command}'"))
                })?;
                if command.is_empty() {
                    format!("{prefix}/{device}")
                } else {
                    format!("{prefix}/{device}/{command}")
                }
            }
        };
        Ok(path)
    }

    /// Absolute URL including query parameters.
    pub fn url(&self, endpoints: &Endpoints, home_id: Option<u64>) -> Result<Url> {
        let base = match self.endpoint {
            Endpoint::MyApi => &endpoints.my_api,
            Endpoint::HopsApi => &endpoints.hops_api,
            Endpoint::Minder => &endpoints.minder,
        };
        let mut url = Url::parse(base)?.join(&self.path(home_id)?)?;
        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(self.params.iter());
        }
        Ok(url)
    }
}
