use std::sync::Arc;

use async_trait::async_trait;

use super::cache::{Epoch, LazyGroup};
use super::ClimateZone;
use crate::backend::pre_line_x::{
    fetch_capabilities, fetch_overlay_default, fetch_zone_state, fetch_zones,
};
use crate::error::{Result, TadoError};
use crate::http::ApiChannel;
use crate::models::pre_line_x::{
    Capabilities, Device, TemperatureRange, Zone as ZoneInfo, ZoneOverlayDefault, ZoneState,
};
use crate::models::{HvacAction, HvacMode, LinkState, OverlayMode, Power, Presence, ZoneType};

/// Lazy handle on a pre-X zone.
///
/// Attributes are grouped by the request that serves them: metadata
/// (`zones`), state (`zones/{id}/state`), capabilities and the default
/// overlay. Each group is fetched on first read and reused until
/// [`update`](ClimateZone::update).
#[derive(Debug)]
pub struct Zone {
    id: u32,
    channel: Arc<ApiChannel>,
    epoch: Epoch,
    metadata: LazyGroup<ZoneInfo>,
    state: LazyGroup<ZoneState>,
    capabilities: LazyGroup<Capabilities>,
    overlay_default: LazyGroup<ZoneOverlayDefault>,
}

impl Zone {
    pub(crate) fn new(channel: Arc<ApiChannel>, id: u32) -> Self {
        Self {
            id,
            channel,
            epoch: Epoch::default(),
            metadata: LazyGroup::empty("metadata"),
            state: LazyGroup::empty("state"),
            capabilities: LazyGroup::empty("capabilities"),
            overlay_default: LazyGroup::empty("overlay_default"),
        }
    }

    /// A handle whose metadata group is already loaded from enumeration.
    pub(crate) fn with_metadata(channel: Arc<ApiChannel>, info: ZoneInfo) -> Self {
        let epoch = Epoch::default();
        let id = info.id;
        let metadata = LazyGroup::seeded("metadata", info, epoch.current());
        Self {
            metadata,
            epoch,
            ..Self::new(channel, id)
        }
    }

    pub async fn metadata(&self) -> Result<Arc<ZoneInfo>> {
        let id = self.id;
        self.metadata
            .get_or_fetch(&self.epoch, || async {
                fetch_zones(&self.channel)
                    .await?
                    .into_iter()
                    .find(|zone| zone.id == id)
                    .ok_or_else(|| TadoError::NotFound(format!("zone {id}")))
            })
            .await
    }

    pub async fn state(&self) -> Result<Arc<ZoneState>> {
        self.state
            .get_or_fetch(&self.epoch, || fetch_zone_state(&self.channel, self.id))
            .await
    }

    pub async fn capabilities(&self) -> Result<Arc<Capabilities>> {
        self.capabilities
            .get_or_fetch(&self.epoch, || fetch_capabilities(&self.channel, self.id))
            .await
    }

    pub async fn overlay_default(&self) -> Result<Arc<ZoneOverlayDefault>> {
        self.overlay_default
            .get_or_fetch(&self.epoch, || fetch_overlay_default(&self.channel, self.id))
            .await
    }

    pub async fn devices(&self) -> Result<Vec<Device>> {
        Ok(self.metadata().await?.devices.clone())
    }

    pub async fn precision(&self) -> Result<f64> {
        Ok(self.state().await?.precision())
    }

    pub async fn overlay_active(&self) -> Result<bool> {
        Ok(self.state().await?.overlay.is_some())
    }

    pub async fn overlay_termination_expiry_seconds(&self) -> Result<Option<u64>> {
        Ok(self
            .state()
            .await?
            .overlay_termination()
            .and_then(|t| t.remaining_time_in_seconds))
    }

    pub async fn min_temp(&self) -> Result<Option<f64>> {
        Ok(self.celsius_range().await?.map(|range| range.min))
    }

    pub async fn max_temp(&self) -> Result<Option<f64>> {
        Ok(self.celsius_range().await?.map(|range| range.max))
    }

    pub async fn temp_step(&self) -> Result<Option<f64>> {
        Ok(self.celsius_range().await?.map(|range| range.step))
    }

    pub async fn default_overlay_termination_type(&self) -> Result<OverlayMode> {
        Ok(self
            .overlay_default()
            .await?
            .termination_condition
            .termination_type)
    }

    pub async fn default_overlay_termination_duration(&self) -> Result<Option<u64>> {
        Ok(self
            .overlay_default()
            .await?
            .termination_condition
            .remaining_time_in_seconds)
    }

    async fn celsius_range(&self) -> Result<Option<TemperatureRange>> {
        Ok(self
            .capabilities()
            .await?
            .temperatures
            .map(|temperatures| temperatures.celsius))
    }

    #[cfg(test)]
    pub(crate) fn loaded_groups(&self) -> [bool; 4] {
        [
            self.metadata.is_loaded(&self.epoch),
            self.state.is_loaded(&self.epoch),
            self.capabilities.is_loaded(&self.epoch),
            self.overlay_default.is_loaded(&self.epoch),
        ]
    }
}

#[async_trait]
impl ClimateZone for Zone {
    fn id(&self) -> u32 {
        self.id
    }

    fn update(&self) {
        let epoch = self.epoch.bump();
        tracing::debug!(zone = self.id, epoch, "Zone cache invalidated");
    }

    async fn name(&self) -> Result<String> {
        Ok(self.metadata().await?.name.clone())
    }

    async fn zone_type(&self) -> Result<ZoneType> {
        Ok(self.metadata().await?.zone_type)
    }

    async fn current_temp(&self) -> Result<Option<f64>> {
        Ok(self.state().await?.current_temp())
    }

    async fn target_temp(&self) -> Result<Option<f64>> {
        Ok(self.state().await?.target_temp())
    }

    async fn current_humidity(&self) -> Result<Option<f64>> {
        Ok(self.state().await?.current_humidity())
    }

    async fn power(&self) -> Result<Power> {
        Ok(self.state().await?.setting.power)
    }

    async fn open_window(&self) -> Result<bool> {
        Ok(self.state().await?.open_window.is_some())
    }

    async fn open_window_expiry_seconds(&self) -> Result<Option<u64>> {
        Ok(self
            .state()
            .await?
            .open_window
            .as_ref()
            .map(|window| window.remaining_time_in_seconds))
    }

    async fn current_hvac_mode(&self) -> Result<HvacMode> {
        Ok(self.state().await?.hvac_mode())
    }

    async fn current_hvac_action(&self) -> Result<HvacAction> {
        Ok(self.state().await?.hvac_action())
    }

    async fn heating_power_percentage(&self) -> Result<Option<f64>> {
        Ok(self.state().await?.heating_power_percentage())
    }

    async fn available(&self) -> Result<bool> {
        Ok(self.state().await?.link.state == LinkState::Online)
    }

    async fn tado_mode(&self) -> Result<Presence> {
        Ok(self.state().await?.tado_mode)
    }

    async fn overlay_termination_type(&self) -> Result<Option<OverlayMode>> {
        Ok(self
            .state()
            .await?
            .overlay_termination()
            .map(|t| t.termination_type))
    }
}
