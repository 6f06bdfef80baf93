//! Backend for X homes (`hops.tado.com`).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::{validate_device_id, validate_zone_id, HomeApi};
use crate::error::{Result, TadoError};
use crate::http::{Action, ApiChannel, ApiRequest};
use crate::models::line_x::{Device, DevicesResponse, Installation, RoomState};
use crate::models::FlowTemperatureOptimization;
use crate::resolver::Family;
use crate::zone::Room;

/// Client for homes with X hardware.
#[derive(Debug, Clone)]
pub struct LineXClient {
    channel: Arc<ApiChannel>,
}

impl LineXClient {
    /// Wrap a channel already bound to a home.
    pub fn new(channel: Arc<ApiChannel>) -> Result<Self> {
        if channel.home_id().is_none() {
            return Err(TadoError::InvalidState(
                "channel is not bound to a home".to_string(),
            ));
        }
        Ok(Self { channel })
    }

    pub fn home_id(&self) -> u64 {
        self.channel.home_id().unwrap_or_default()
    }

    pub async fn get_device_info(&self, serial: &str) -> Result<Device> {
        let serial = validate_device_id(serial)?;
        self.channel
            .fetch("device", &ApiRequest::hops(format!("devices/{serial}")))
            .await
    }

    pub async fn set_open_window(&self, room_id: u32) -> Result<()> {
        let room_id = validate_zone_id(room_id)?;
        let request = ApiRequest::hops(format!("rooms/{room_id}/openWindow")).action(Action::Set);
        self.channel.execute(&request).await
    }

    pub async fn reset_open_window(&self, room_id: u32) -> Result<()> {
        let room_id = validate_zone_id(room_id)?;
        let request = ApiRequest::hops(format!("rooms/{room_id}/openWindow")).action(Action::Reset);
        self.channel.execute(&request).await
    }

    pub async fn set_child_lock(&self, serial: &str, enabled: bool) -> Result<()> {
        self.patch_device(serial, json!({ "childLockEnabled": enabled }))
            .await
    }

    pub async fn set_temp_offset(&self, serial: &str, celsius: f64) -> Result<()> {
        if !celsius.is_finite() {
            return Err(TadoError::InvalidArgument(format!(
                "temperature offset must be finite, got {celsius}"
            )));
        }
        self.patch_device(serial, json!({ "temperatureOffset": celsius }))
            .await
    }

    /// Boost every room of the home.
    pub async fn boost_all_heating(&self) -> Result<()> {
        self.quick_action("boost").await
    }

    /// Switch every room of the home off.
    pub async fn disable_all_heating(&self) -> Result<()> {
        self.quick_action("allOff").await
    }

    /// Drop manual overrides in every room.
    pub async fn resume_all_schedules(&self) -> Result<()> {
        self.quick_action("resumeSchedule").await
    }

    pub async fn get_flow_temperature_optimization(&self) -> Result<FlowTemperatureOptimization> {
        self.channel
            .fetch(
                "flow temperature optimization",
                &ApiRequest::hops("settings/flowTemperatureOptimization"),
            )
            .await
    }

    pub async fn set_flow_temperature_optimization(&self, max_flow_temperature: f64) -> Result<()> {
        let request = ApiRequest::hops("settings/flowTemperatureOptimization")
            .action(Action::Change)
            .payload(json!({ "maxFlowTemperature": max_flow_temperature }));
        self.channel.execute(&request).await
    }

    pub async fn get_installation(&self) -> Result<Installation> {
        self.channel
            .fetch("installation", &ApiRequest::hops(""))
            .await
    }

    pub async fn set_incident_detection(&self, enabled: bool) -> Result<()> {
        self.change_home_setting("incidentDetection", json!({ "enabled": enabled }))
            .await
    }

    pub async fn set_boiler_presence(&self, present: bool) -> Result<()> {
        self.change_home_setting("heatingSystem/boiler", json!({ "present": present }))
            .await
    }

    pub async fn set_underfloor_heating_presence(&self, present: bool) -> Result<()> {
        self.change_home_setting("heatingSystem/underfloorHeating", json!({ "present": present }))
            .await
    }

    /// Home-wide settings live on the classic API for X homes too.
    async fn change_home_setting(&self, command: &str, payload: serde_json::Value) -> Result<()> {
        let request = ApiRequest::home(command)
            .action(Action::Change)
            .payload(payload);
        self.channel.execute(&request).await
    }

    async fn patch_device(&self, serial: &str, payload: serde_json::Value) -> Result<()> {
        let serial = validate_device_id(serial)?;
        let request = ApiRequest::hops(format!("roomsAndDevices/devices/{serial}"))
            .action(Action::Change)
            .payload(payload);
        self.channel.execute(&request).await
    }

    async fn quick_action(&self, action: &str) -> Result<()> {
        let request = ApiRequest::hops(format!("quickActions/{action}")).action(Action::Set);
        self.channel.execute(&request).await
    }
}

#[async_trait]
impl HomeApi for LineXClient {
    type Device = Device;
    type ZoneState = RoomState;
    type Zone = Room;

    fn family(&self) -> Family {
        Family::LineX
    }

    fn channel(&self) -> &Arc<ApiChannel> {
        &self.channel
    }

    async fn get_devices(&self) -> Result<Vec<Device>> {
        Ok(fetch_rooms_and_devices(&self.channel).await?.into_devices())
    }

    async fn get_zones(&self) -> Result<Vec<Room>> {
        let response = fetch_rooms_and_devices(&self.channel).await?;
        Ok(response
            .with_room_links()
            .rooms
            .into_iter()
            .map(|room| Room::with_metadata(Arc::clone(&self.channel), room))
            .collect())
    }

    async fn get_zone(&self, zone_id: u32) -> Result<Room> {
        Ok(Room::new(Arc::clone(&self.channel), validate_zone_id(zone_id)?))
    }

    async fn get_zone_state(&self, zone_id: u32) -> Result<RoomState> {
        fetch_room_state(&self.channel, validate_zone_id(zone_id)?).await
    }

    async fn get_zone_states(&self) -> Result<BTreeMap<u32, RoomState>> {
        let rooms: Vec<RoomState> = self
            .channel
            .fetch("rooms", &ApiRequest::hops("rooms"))
            .await?;
        Ok(rooms.into_iter().map(|room| (room.id, room)).collect())
    }
}

pub(crate) async fn fetch_rooms_and_devices(channel: &ApiChannel) -> Result<DevicesResponse> {
    channel
        .fetch("rooms and devices", &ApiRequest::hops("roomsAndDevices"))
        .await
}

pub(crate) async fn fetch_room_state(channel: &ApiChannel, room_id: u32) -> Result<RoomState> {
    channel
        .fetch("room state", &ApiRequest::hops(format!("rooms/{room_id}")))
        .await
}
