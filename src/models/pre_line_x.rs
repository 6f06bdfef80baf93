//! Zone and device records of the classic (`my.tado.com`) API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{Humidity, TempPrecision, Temperature};
use super::types::{
    BatteryState, HvacAction, HvacMode, LinkState, OverlayMode, Power, Presence, ZoneType,
};

/// Step used when the vendor does not report one.
pub const DEFAULT_PRECISION: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConnectionState {
    #[serde(default)]
    pub value: bool,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Characteristics {
    #[serde(default)]
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_type: String,
    pub serial_no: String,
    pub short_serial_no: String,
    pub current_fw_version: String,
    pub connection_state: DeviceConnectionState,
    #[serde(default)]
    pub characteristics: Option<Characteristics>,
    #[serde(default)]
    pub in_pairing_mode: Option<bool>,
    #[serde(default)]
    pub battery_state: Option<BatteryState>,
    #[serde(default)]
    pub child_lock_enabled: Option<bool>,
    #[serde(default)]
    pub orientation: Option<String>,
    #[serde(default)]
    pub duties: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenWindowDetection {
    pub supported: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub timeout_in_seconds: u32,
}

/// `GET homes/{id}/zones` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub device_types: Vec<String>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub report_available: Option<bool>,
    #[serde(default)]
    pub open_window_detection: Option<OpenWindowDetection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub power: Power,
    #[serde(default, rename = "type")]
    pub zone_type: Option<ZoneType>,
    #[serde(default)]
    pub mode: Option<HvacMode>,
    #[serde(default)]
    pub temperature: Option<Temperature>,
    #[serde(default)]
    pub fan_level: Option<String>,
    #[serde(default)]
    pub vertical_swing: Option<String>,
    #[serde(default)]
    pub horizontal_swing: Option<String>,
    #[serde(default)]
    pub is_boost: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Termination {
    #[serde(rename = "type")]
    pub termination_type: OverlayMode,
    #[serde(default)]
    pub type_skill_based_app: Option<OverlayMode>,
    #[serde(default, alias = "expiry")]
    pub projected_expiry: Option<DateTime<Utc>>,
    #[serde(default, alias = "durationInSeconds")]
    pub remaining_time_in_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    #[serde(rename = "type")]
    pub overlay_type: OverlayMode,
    pub setting: Setting,
    #[serde(default)]
    pub termination: Option<Termination>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenWindow {
    pub detected_time: DateTime<Utc>,
    pub duration_in_seconds: u64,
    pub expiry: DateTime<Utc>,
    pub remaining_time_in_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkReason {
    pub code: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub state: LinkState,
    #[serde(default)]
    pub reason: Option<LinkReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatingPower {
    pub percentage: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcPower {
    pub value: Power,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDataPoints {
    #[serde(default)]
    pub heating_power: Option<HeatingPower>,
    #[serde(default)]
    pub ac_power: Option<AcPower>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsideTemperature {
    pub celsius: f64,
    pub fahrenheit: f64,
    #[serde(default)]
    pub precision: Option<TempPrecision>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorDataPoints {
    #[serde(default)]
    pub inside_temperature: Option<InsideTemperature>,
    #[serde(default)]
    pub humidity: Option<Humidity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextTimeBlock {
    pub start: DateTime<Utc>,
}

/// `GET homes/{id}/zones/{zone}/state`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneState {
    pub tado_mode: Presence,
    #[serde(default)]
    pub geolocation_override: bool,
    pub setting: Setting,
    #[serde(default)]
    pub overlay_type: Option<String>,
    #[serde(default)]
    pub overlay: Option<Overlay>,
    #[serde(default)]
    pub open_window: Option<OpenWindow>,
    #[serde(default)]
    pub open_window_detected: Option<bool>,
    #[serde(default)]
    pub next_time_block: Option<NextTimeBlock>,
    pub link: Link,
    #[serde(default)]
    pub activity_data_points: ActivityDataPoints,
    #[serde(default)]
    pub sensor_data_points: SensorDataPoints,
    #[serde(default)]
    pub termination_condition: Option<Termination>,
}

impl ZoneState {
    pub fn current_temp(&self) -> Option<f64> {
        self.sensor_data_points
            .inside_temperature
            .as_ref()
            .map(|t| t.celsius)
    }

    pub fn target_temp(&self) -> Option<f64> {
        self.setting.temperature.as_ref().map(|t| t.celsius)
    }

    pub fn current_humidity(&self) -> Option<f64> {
        self.sensor_data_points.humidity.as_ref().map(|h| h.percentage)
    }

    pub fn heating_power_percentage(&self) -> Option<f64> {
        self.activity_data_points
            .heating_power
            .as_ref()
            .map(|p| p.percentage)
    }

    pub fn precision(&self) -> f64 {
        self.sensor_data_points
            .inside_temperature
            .as_ref()
            .and_then(|t| t.precision)
            .map_or(DEFAULT_PRECISION, |p| p.celsius)
    }

    /// Without an overlay the zone follows its smart schedule.
    pub fn hvac_mode(&self) -> HvacMode {
        if self.setting.power != Power::On {
            return HvacMode::Off;
        }
        if self.overlay.is_none() {
            return HvacMode::SmartSchedule;
        }
        match (self.setting.mode, self.setting.zone_type) {
            (Some(mode), _) => mode,
            (None, Some(ZoneType::AirConditioning)) => HvacMode::Cool,
            (None, _) => HvacMode::Heat,
        }
    }

    pub fn hvac_action(&self) -> HvacAction {
        if self.setting.power != Power::On {
            return HvacAction::Off;
        }
        if self.heating_power_percentage().unwrap_or(0.0) > 0.0 {
            return match self.setting.zone_type {
                Some(ZoneType::HotWater) => HvacAction::HotWater,
                _ => HvacAction::Heating,
            };
        }
        let ac_on = self
            .activity_data_points
            .ac_power
            .as_ref()
            .is_some_and(|p| p.value == Power::On);
        if ac_on {
            return match self.setting.mode {
                Some(HvacMode::Heat) => HvacAction::Heating,
                Some(HvacMode::Dry) => HvacAction::Drying,
                Some(HvacMode::Fan) => HvacAction::Fan,
                _ => HvacAction::Cooling,
            };
        }
        HvacAction::Idle
    }

    pub fn overlay_termination(&self) -> Option<&Termination> {
        self.overlay.as_ref().and_then(|o| o.termination.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_step")]
    pub step: f64,
}

fn default_step() -> f64 {
    DEFAULT_PRECISION
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureCapability {
    pub celsius: TemperatureRange,
    #[serde(default)]
    pub fahrenheit: Option<TemperatureRange>,
}

/// `GET homes/{id}/zones/{zone}/capabilities`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    #[serde(default)]
    pub temperatures: Option<TemperatureCapability>,
    #[serde(default)]
    pub can_set_temperature: Option<bool>,
}

/// `GET homes/{id}/zones/{zone}/defaultOverlay`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneOverlayDefault {
    pub termination_condition: Termination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duties {
    #[serde(rename = "type")]
    pub duty_type: String,
    #[serde(default)]
    pub leader: Option<Device>,
    #[serde(default)]
    pub drivers: Vec<Device>,
    #[serde(default)]
    pub uis: Vec<Device>,
}

/// `GET homes/{id}/zones/{zone}/control`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneControl {
    #[serde(rename = "type")]
    pub control_type: String,
    pub early_start_enabled: bool,
    #[serde(default)]
    pub heating_circuit: Option<u32>,
    #[serde(default)]
    pub duties: Option<Duties>,
}

/// `GET homes/{id}/heatingCircuits` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatingCircuit {
    pub number: u32,
    pub driver_serial_no: String,
    pub driver_short_serial_no: String,
}

/// `GET homeByBridge/{bridge}/boilerMaxOutputTemperature`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxOutputTemp {
    pub boiler_max_output_temperature_in_celsius: f64,
}

/// The device wired to the boiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermDevice {
    #[serde(rename = "type")]
    pub device_type: String,
    pub serial_no: String,
    pub therm_interface_type: String,
    pub connected: bool,
    pub last_request_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boiler {
    pub output_temperature: Temperature,
}

/// `GET homeByBridge/{bridge}/boilerWiringInstallationState`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WiringInstallationState {
    pub state: String,
    pub device_wired_to_boiler: ThermDevice,
    pub bridge_connected: bool,
    pub hot_water_zone_present: bool,
    pub boiler: Boiler,
}
