//! Entry point: build a client for the account's home.
//!
//! [`ClientInitializer`] owns the shared pieces (transport, clock, token
//! store) and turns them into a [`TadoClient`] bound to exactly one backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use crate::auth::{
    DeviceAuthSession, DeviceFlowStatus, FileTokenSink, OAuthClient, Token, TokenSink, TokenStore,
};
use crate::backend::{HomeApi, LineXClient, PreLineXClient};
use crate::config::ClientConfig;
use crate::error::{Result, TadoError};
use crate::http::{ApiChannel, HttpTransport, ReqwestTransport};
use crate::models::{line_x, pre_line_x};
use crate::models::{
    AirComfort, DayReport, Home, HomeState, MobileDevice, Presence, RunningTimes, User, Weather,
};
use crate::resolver::{CapabilityResolver, Family, HomeProfile};
use crate::util::clock::{Clock, SystemClock};
use crate::zone::ZoneHandle;

/// The backend selected for a home. Fixed for the client's lifetime.
#[derive(Debug, Clone)]
pub enum Backend {
    PreLineX(PreLineXClient),
    LineX(LineXClient),
}

/// A device of either generation.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceRecord {
    PreLineX(pre_line_x::Device),
    LineX(line_x::Device),
}

impl DeviceRecord {
    pub fn serial_number(&self) -> &str {
        match self {
            Self::PreLineX(device) => &device.serial_no,
            Self::LineX(device) => &device.serial_number,
        }
    }

    pub fn device_type(&self) -> &str {
        match self {
            Self::PreLineX(device) => &device.device_type,
            Self::LineX(device) => &device.device_type,
        }
    }
}

/// A zone state of either generation.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneStateRecord {
    Zone(pre_line_x::ZoneState),
    Room(line_x::RoomState),
}

impl ZoneStateRecord {
    pub fn current_temp(&self) -> Option<f64> {
        match self {
            Self::Zone(state) => state.current_temp(),
            Self::Room(state) => Some(state.sensor_data_points.inside_temperature.celsius),
        }
    }

    pub fn target_temp(&self) -> Option<f64> {
        match self {
            Self::Zone(state) => state.target_temp(),
            Self::Room(state) => state.target_temp(),
        }
    }
}

macro_rules! on_backend {
    ($self:ident, $client:ident => $body:expr) => {
        match &$self.backend {
            Backend::PreLineX($client) => $body,
            Backend::LineX($client) => $body,
        }
    };
}

/// Client for one home, with the backend its hardware generation needs.
#[derive(Debug, Clone)]
pub struct TadoClient {
    backend: Backend,
    profile: HomeProfile,
    tokens: Arc<TokenStore>,
}

impl TadoClient {
    fn new(backend: Backend, profile: HomeProfile, tokens: Arc<TokenStore>) -> Self {
        Self {
            backend,
            profile,
            tokens,
        }
    }

    pub fn family(&self) -> Family {
        self.profile.family
    }

    pub fn home_id(&self) -> u64 {
        self.profile.home_id
    }

    pub fn home(&self) -> &Home {
        &self.profile.home
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Family-specific operations of a pre-X home.
    pub fn as_pre_line_x(&self) -> Option<&PreLineXClient> {
        match &self.backend {
            Backend::PreLineX(client) => Some(client),
            Backend::LineX(_) => None,
        }
    }

    /// Family-specific operations of an X home.
    pub fn as_line_x(&self) -> Option<&LineXClient> {
        match &self.backend {
            Backend::LineX(client) => Some(client),
            Backend::PreLineX(_) => None,
        }
    }

    pub fn token_store(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Current refresh token, for callers that persist it themselves.
    pub fn refresh_token(&self) -> Option<String> {
        self.tokens.refresh_token()
    }

    pub async fn get_me(&self) -> Result<User> {
        on_backend!(self, client => client.get_me().await)
    }

    pub async fn get_devices(&self) -> Result<Vec<DeviceRecord>> {
        match &self.backend {
            Backend::PreLineX(client) => Ok(client
                .get_devices()
                .await?
                .into_iter()
                .map(DeviceRecord::PreLineX)
                .collect()),
            Backend::LineX(client) => Ok(client
                .get_devices()
                .await?
                .into_iter()
                .map(DeviceRecord::LineX)
                .collect()),
        }
    }

    /// Handles for every zone, in the order the vendor lists them.
    pub async fn get_zones(&self) -> Result<Vec<ZoneHandle>> {
        on_backend!(self, client => Ok(client
            .get_zones()
            .await?
            .into_iter()
            .map(ZoneHandle::from)
            .collect()))
    }

    pub async fn get_zone(&self, zone_id: u32) -> Result<ZoneHandle> {
        on_backend!(self, client => client.get_zone(zone_id).await.map(ZoneHandle::from))
    }

    pub async fn get_zone_state(&self, zone_id: u32) -> Result<ZoneStateRecord> {
        match &self.backend {
            Backend::PreLineX(client) => client
                .get_zone_state(zone_id)
                .await
                .map(ZoneStateRecord::Zone),
            Backend::LineX(client) => client
                .get_zone_state(zone_id)
                .await
                .map(ZoneStateRecord::Room),
        }
    }

    pub async fn get_zone_states(&self) -> Result<BTreeMap<u32, ZoneStateRecord>> {
        match &self.backend {
            Backend::PreLineX(client) => Ok(client
                .get_zone_states()
                .await?
                .into_iter()
                .map(|(id, state)| (id, ZoneStateRecord::Zone(state)))
                .collect()),
            Backend::LineX(client) => Ok(client
                .get_zone_states()
                .await?
                .into_iter()
                .map(|(id, state)| (id, ZoneStateRecord::Room(state)))
                .collect()),
        }
    }

    pub async fn get_home_state(&self) -> Result<HomeState> {
        on_backend!(self, client => client.get_home_state().await)
    }

    pub async fn get_auto_geofencing_supported(&self) -> Result<bool> {
        on_backend!(self, client => client.get_auto_geofencing_supported().await)
    }

    pub async fn set_home(&self) -> Result<()> {
        on_backend!(self, client => client.set_home().await)
    }

    pub async fn set_away(&self) -> Result<()> {
        on_backend!(self, client => client.set_away().await)
    }

    pub async fn change_presence(&self, presence: Presence) -> Result<()> {
        on_backend!(self, client => client.change_presence(presence).await)
    }

    pub async fn get_weather(&self) -> Result<Weather> {
        on_backend!(self, client => client.get_weather().await)
    }

    pub async fn get_air_comfort(&self) -> Result<AirComfort> {
        on_backend!(self, client => client.get_air_comfort().await)
    }

    pub async fn get_users(&self) -> Result<Vec<User>> {
        on_backend!(self, client => client.get_users().await)
    }

    pub async fn get_mobile_devices(&self) -> Result<Vec<MobileDevice>> {
        on_backend!(self, client => client.get_mobile_devices().await)
    }

    pub async fn get_running_times(&self, from: NaiveDate) -> Result<RunningTimes> {
        on_backend!(self, client => client.get_running_times(from).await)
    }

    pub async fn get_historic(&self, zone_id: u32, date: NaiveDate) -> Result<DayReport> {
        on_backend!(self, client => client.get_historic(zone_id, date).await)
    }
}

/// Assembles the shared transport, clock and token store, then
/// authenticates and resolves the home.
///
/// ```no_run
/// # async fn run() -> tado_client::Result<()> {
/// use tado_client::{ClientConfig, ClientInitializer};
/// use tokio_util::sync::CancellationToken;
///
/// let init = ClientInitializer::new(ClientConfig::from_env())?;
/// let client = init.authenticate(&CancellationToken::new()).await?;
/// for zone in client.get_zones().await? {
///     use tado_client::zone::ClimateZone;
///     println!("{}: {:?}", zone.name().await?, zone.current_temp().await?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ClientInitializer {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    tokens: Arc<TokenStore>,
    oauth: Arc<OAuthClient>,
}

impl std::fmt::Debug for ClientInitializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientInitializer")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl ClientInitializer {
    /// Prepare the shared components and load a stored refresh token.
    ///
    /// `saved_refresh_token` takes precedence over the token file. An
    /// unreadable token file is logged and treated as absent.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.client_id.trim().is_empty() {
            return Err(TadoError::Configuration(
                "client_id must not be empty".to_string(),
            ));
        }
        let transport = config
            .http_session
            .clone()
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new()) as Arc<dyn HttpTransport>);
        let clock = config
            .clock
            .clone()
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let sink: Option<Arc<dyn TokenSink>> = config
            .token_file_path
            .as_ref()
            .map(|path| Arc::new(FileTokenSink::new(path.clone())) as Arc<dyn TokenSink>);

        let stored = match config
            .saved_refresh_token
            .clone()
            .filter(|token| !token.trim().is_empty())
        {
            Some(token) => Some(token),
            None => match sink.as_ref().map(|sink| sink.load()).transpose() {
                Ok(loaded) => loaded.flatten(),
                Err(err) => {
                    tracing::warn!(error = %err, "Stored refresh token could not be read");
                    None
                }
            },
        };

        let tokens = Arc::new(match stored {
            Some(refresh_token) => {
                TokenStore::with_token(Token::from_refresh_token(refresh_token), sink)
            }
            None => TokenStore::new(sink),
        });
        let oauth = Arc::new(OAuthClient::new(&config, transport.clone(), clock.clone()));

        Ok(Self {
            config,
            transport,
            clock,
            tokens,
            oauth,
        })
    }

    /// Whether a refresh token is available to skip the device flow.
    pub fn is_resumable(&self) -> bool {
        self.tokens.is_resumable()
    }

    pub fn token_store(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Resume from the stored refresh token. `Ok(None)` when there is none.
    pub async fn resume(&self) -> Result<Option<TadoClient>> {
        if !self.is_resumable() {
            return Ok(None);
        }
        let channel = self.channel();
        channel.force_refresh().await?;
        self.connect_with(channel).await.map(Some)
    }

    /// A fresh device flow sharing this initializer's token store.
    pub fn device_session(&self) -> DeviceAuthSession {
        DeviceAuthSession::new(
            Arc::clone(&self.oauth),
            Arc::clone(&self.tokens),
            Arc::clone(&self.clock),
        )
    }

    /// Resolve the home with the tokens already in the store.
    pub async fn connect(&self) -> Result<TadoClient> {
        self.connect_with(self.channel()).await
    }

    /// Resume if possible, otherwise run the device flow to completion.
    ///
    /// A rejected stored refresh token is dropped and the device flow runs
    /// instead. The verification URL is logged at info level; callers that
    /// display it themselves should drive [`Self::device_session`].
    pub async fn authenticate(&self, cancel: &CancellationToken) -> Result<TadoClient> {
        if self.is_resumable() {
            match self.resume().await {
                Ok(Some(client)) => return Ok(client),
                Ok(None) => {}
                Err(TadoError::ReauthenticationRequired(reason)) => {
                    tracing::warn!(%reason, "Stored refresh token rejected, starting device flow");
                    if let Err(err) = self.tokens.clear() {
                        tracing::warn!(error = %err, "Stored refresh token could not be removed");
                    }
                }
                Err(err) => return Err(err),
            }
        }

        let mut session = self.device_session();
        match session.run_until_complete(cancel).await? {
            DeviceFlowStatus::Completed => self.connect().await,
            DeviceFlowStatus::Expired => Err(TadoError::AuthFlow(
                "device authorization expired before it was confirmed".to_string(),
            )),
            status => Err(TadoError::AuthFlow(format!(
                "device authorization ended in {status}: {}",
                session.failure_reason().unwrap_or("no reason given")
            ))),
        }
    }

    fn channel(&self) -> Arc<ApiChannel> {
        Arc::new(ApiChannel::new(
            &self.config,
            Arc::clone(&self.transport),
            Arc::clone(&self.tokens),
            Arc::clone(&self.oauth),
            Arc::clone(&self.clock),
        ))
    }

    async fn connect_with(&self, channel: Arc<ApiChannel>) -> Result<TadoClient> {
        let profile = CapabilityResolver::new(&channel).resolve().await?;
        let backend = match profile.family {
            Family::PreLineX => Backend::PreLineX(PreLineXClient::new(channel)?),
            Family::LineX => Backend::LineX(LineXClient::new(channel)?),
        };
        Ok(TadoClient::new(backend, profile, Arc::clone(&self.tokens)))
    }
}
