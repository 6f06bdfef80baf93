use std::sync::Arc;

use async_trait::async_trait;

use super::cache::{Epoch, LazyGroup};
use super::ClimateZone;
use crate::backend::fetch_home_state;
use crate::backend::line_x::{fetch_room_state, fetch_rooms_and_devices};
use crate::error::{Result, TadoError};
use crate::http::ApiChannel;
use crate::models::line_x::{self, Device, DevicesRoom, RoomState};
use crate::models::{HomeState, HvacAction, HvacMode, OverlayMode, Power, Presence, ZoneType};

/// Lazy handle on an X room.
///
/// Groups: room metadata (`roomsAndDevices`), room state (`rooms/{id}`) and
/// the home state, which carries the presence shown as `tado_mode`.
#[derive(Debug)]
pub struct Room {
    id: u32,
    channel: Arc<ApiChannel>,
    epoch: Epoch,
    room: LazyGroup<DevicesRoom>,
    state: LazyGroup<RoomState>,
    home_state: LazyGroup<HomeState>,
}

impl Room {
    pub(crate) fn new(channel: Arc<ApiChannel>, id: u32) -> Self {
        Self {
            id,
            channel,
            epoch: Epoch::default(),
            room: LazyGroup::empty("room"),
            state: LazyGroup::empty("state"),
            home_state: LazyGroup::empty("home_state"),
        }
    }

    pub(crate) fn with_metadata(channel: Arc<ApiChannel>, room: DevicesRoom) -> Self {
        let epoch = Epoch::default();
        let id = room.room_id;
        let seeded = LazyGroup::seeded("room", room, epoch.current());
        Self {
            room: seeded,
            epoch,
            ..Self::new(channel, id)
        }
    }

    pub async fn room(&self) -> Result<Arc<DevicesRoom>> {
        let id = self.id;
        self.room
            .get_or_fetch(&self.epoch, || async {
                fetch_rooms_and_devices(&self.channel)
                    .await?
                    .with_room_links()
                    .rooms
                    .into_iter()
                    .find(|room| room.room_id == id)
                    .ok_or_else(|| TadoError::NotFound(format!("room {id}")))
            })
            .await
    }

    pub async fn state(&self) -> Result<Arc<RoomState>> {
        self.state
            .get_or_fetch(&self.epoch, || fetch_room_state(&self.channel, self.id))
            .await
    }

    pub async fn home_state(&self) -> Result<Arc<HomeState>> {
        self.home_state
            .get_or_fetch(&self.epoch, || fetch_home_state(&self.channel))
            .await
    }

    pub async fn devices(&self) -> Result<Vec<Device>> {
        Ok(self.room().await?.devices.clone())
    }

    pub async fn boost_active(&self) -> Result<bool> {
        Ok(self.state().await?.boost_mode.is_some())
    }

    pub async fn overlay_active(&self) -> Result<bool> {
        Ok(self.state().await?.manual_control_termination.is_some())
    }

    pub async fn overlay_termination_expiry_seconds(&self) -> Result<Option<u64>> {
        Ok(self
            .state()
            .await?
            .active_termination()
            .and_then(|t| t.remaining_time_in_seconds))
    }

    pub async fn default_overlay_termination_type(&self) -> Result<Option<OverlayMode>> {
        Ok(self
            .room()
            .await?
            .device_manual_control_termination
            .as_ref()
            .map(|t| t.termination_type))
    }

    /// X rooms do not publish setpoint limits; these are the fixed ones.
    pub fn min_temp(&self) -> f64 {
        line_x::MIN_TEMP
    }

    pub fn max_temp(&self) -> f64 {
        line_x::MAX_TEMP
    }

    pub fn temp_step(&self) -> f64 {
        line_x::PRECISION
    }

    #[cfg(test)]
    pub(crate) fn loaded_groups(&self) -> [bool; 3] {
        [
            self.room.is_loaded(&self.epoch),
            self.state.is_loaded(&self.epoch),
            self.home_state.is_loaded(&self.epoch),
        ]
    }
}

#[async_trait]
impl ClimateZone for Room {
    fn id(&self) -> u32 {
        self.id
    }

    fn update(&self) {
        let epoch = self.epoch.bump();
        tracing::debug!(room = self.id, epoch, "Room cache invalidated");
    }

    async fn name(&self) -> Result<String> {
        Ok(self.room().await?.room_name.clone())
    }

    /// Only heating rooms exist on X.
    async fn zone_type(&self) -> Result<ZoneType> {
        Ok(ZoneType::Heating)
    }

    async fn current_temp(&self) -> Result<Option<f64>> {
        Ok(Some(self.state().await?.sensor_data_points.inside_temperature.celsius))
    }

    async fn target_temp(&self) -> Result<Option<f64>> {
        Ok(self.state().await?.target_temp())
    }

    async fn current_humidity(&self) -> Result<Option<f64>> {
        Ok(Some(self.state().await?.sensor_data_points.humidity.percentage))
    }

    async fn power(&self) -> Result<Power> {
        Ok(self.state().await?.setting.power)
    }

    async fn open_window(&self) -> Result<bool> {
        Ok(self
            .state()
            .await?
            .open_window
            .is_some_and(|window| window.activated))
    }

    async fn open_window_expiry_seconds(&self) -> Result<Option<u64>> {
        Ok(self
            .state()
            .await?
            .open_window
            .and_then(|window| window.expiry_in_seconds))
    }

    async fn current_hvac_mode(&self) -> Result<HvacMode> {
        Ok(self.state().await?.hvac_mode())
    }

    async fn current_hvac_action(&self) -> Result<HvacAction> {
        Ok(self.state().await?.hvac_action())
    }

    async fn heating_power_percentage(&self) -> Result<Option<f64>> {
        Ok(Some(self.state().await?.heating_power.percentage))
    }

    async fn available(&self) -> Result<bool> {
        Ok(self.state().await?.is_connected())
    }

    async fn tado_mode(&self) -> Result<Presence> {
        Ok(self.home_state().await?.presence)
    }

    async fn overlay_termination_type(&self) -> Result<Option<OverlayMode>> {
        Ok(self
            .state()
            .await?
            .active_termination()
            .map(|t| t.termination_type))
    }
}
