//! Room and device records of the X (`hops.tado.com`) API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::Temperature;
use super::types::{BatteryState, ConnectionState, HvacAction, HvacMode, OverlayMode, Power};

/// Setpoint bounds of X rooms, which do not expose capabilities.
pub const MIN_TEMP: f64 = 5.0;
pub const MAX_TEMP: f64 = 30.0;
pub const PRECISION: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub state: ConnectionState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub serial_number: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub firmware_version: String,
    pub connection: Connection,
    #[serde(default)]
    pub mounting_state: Option<String>,
    #[serde(default)]
    pub battery_state: Option<BatteryState>,
    #[serde(default)]
    pub child_lock_enabled: Option<bool>,
    #[serde(default)]
    pub temperature_as_measured: Option<f64>,
    #[serde(default)]
    pub temperature_offset: Option<f64>,
    /// Filled in from the enclosing room.
    #[serde(default)]
    pub room_id: Option<u32>,
    #[serde(default)]
    pub room_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceManualControlTermination {
    #[serde(rename = "type")]
    pub termination_type: OverlayMode,
    #[serde(default)]
    pub duration_in_seconds: Option<u64>,
}

/// A room as listed by `roomsAndDevices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicesRoom {
    pub room_id: u32,
    pub room_name: String,
    #[serde(default)]
    pub device_manual_control_termination: Option<DeviceManualControlTermination>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub zone_controller_assignable: Option<bool>,
    #[serde(default)]
    pub room_link_available: Option<bool>,
}

/// `GET homes/{id}/roomsAndDevices`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicesResponse {
    pub rooms: Vec<DevicesRoom>,
    #[serde(default)]
    pub other_devices: Vec<Device>,
}

impl DevicesResponse {
    /// Stamp every device with the room it belongs to.
    pub fn with_room_links(mut self) -> Self {
        for room in &mut self.rooms {
            for device in &mut room.devices {
                device.room_id = Some(room.room_id);
                device.room_name = Some(room.room_name.clone());
            }
        }
        self
    }

    /// Room devices in room order, followed by unassigned devices.
    pub fn into_devices(self) -> Vec<Device> {
        let linked = self.with_room_links();
        linked
            .rooms
            .into_iter()
            .flat_map(|room| room.devices)
            .chain(linked.other_devices)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenWindow {
    pub activated: bool,
    #[serde(default)]
    pub expiry_in_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualControlTermination {
    #[serde(rename = "type")]
    pub termination_type: OverlayMode,
    #[serde(default)]
    pub remaining_time_in_seconds: Option<u64>,
    #[serde(default)]
    pub projected_expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextTimeBlock {
    pub start: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSetting {
    pub power: Power,
    #[serde(default)]
    pub temperature: Option<Temperature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomHumidity {
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSensorDataPoints {
    pub inside_temperature: Temperature,
    pub humidity: RoomHumidity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomHeatingPower {
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextScheduleChange {
    pub start: DateTime<Utc>,
    pub setting: RoomSetting,
}

/// `GET homes/{id}/rooms/{room}`; the X replacement for zone state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub id: u32,
    pub name: String,
    pub sensor_data_points: RoomSensorDataPoints,
    pub setting: RoomSetting,
    pub heating_power: RoomHeatingPower,
    pub connection: Connection,
    #[serde(default)]
    pub open_window: Option<OpenWindow>,
    #[serde(default)]
    pub next_schedule_change: Option<NextScheduleChange>,
    #[serde(default)]
    pub next_time_block: Option<NextTimeBlock>,
    #[serde(default)]
    pub balance_control: Option<String>,
    #[serde(default)]
    pub manual_control_termination: Option<ManualControlTermination>,
    #[serde(default)]
    pub boost_mode: Option<ManualControlTermination>,
}

impl RoomState {
    pub fn target_temp(&self) -> Option<f64> {
        self.setting.temperature.as_ref().map(|t| t.celsius)
    }

    /// Manual control or boost counts as heating; otherwise the schedule runs.
    pub fn hvac_mode(&self) -> HvacMode {
        if self.setting.power != Power::On {
            return HvacMode::Off;
        }
        if self.manual_control_termination.is_some() || self.boost_mode.is_some() {
            HvacMode::Heat
        } else {
            HvacMode::Auto
        }
    }

    pub fn hvac_action(&self) -> HvacAction {
        if self.setting.power != Power::On {
            HvacAction::Off
        } else if self.heating_power.percentage > 0.0 {
            HvacAction::Heating
        } else {
            HvacAction::Idle
        }
    }

    pub fn active_termination(&self) -> Option<&ManualControlTermination> {
        self.manual_control_termination
            .as_ref()
            .or(self.boost_mode.as_ref())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.state == ConnectionState::Connected
    }
}

/// `GET homes/{id}` of the X API.
///
/// Only the id is guaranteed; the remaining settings vary by installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub away_radius_in_meters: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
