//! Records shared by both generations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::Presence;

/// The authenticated account (`GET me`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub email: String,
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub locale: Option<String>,
    pub homes: Vec<HomeSummary>,
    #[serde(default)]
    pub mobile_devices: Vec<MobileDevice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeSummary {
    pub id: u64,
    pub name: String,
}

/// `GET homes/{id}`; `generation` tells the API family apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub temperature_unit: Option<String>,
    #[serde(default)]
    pub generation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempPrecision {
    pub celsius: f64,
    pub fahrenheit: f64,
}

/// A temperature reading.
///
/// The classic API sends `celsius`/`fahrenheit`, the X API a bare `value`
/// in Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Temperature {
    #[serde(alias = "value")]
    pub celsius: f64,
    #[serde(default)]
    pub fahrenheit: Option<f64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub precision: Option<TempPrecision>,
}

impl Temperature {
    pub fn from_celsius(celsius: f64) -> Self {
        Self {
            celsius,
            fahrenheit: None,
            kind: None,
            timestamp: None,
            precision: None,
        }
    }

    pub fn in_fahrenheit(&self) -> f64 {
        self.fahrenheit.unwrap_or(self.celsius * 9.0 / 5.0 + 32.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Humidity {
    pub percentage: f64,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarIntensity {
    pub percentage: f64,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherState {
    pub value: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// `GET homes/{id}/weather`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub outside_temperature: Temperature,
    pub solar_intensity: SolarIntensity,
    pub weather_state: WeatherState,
}

/// `GET homes/{id}/state`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeState {
    pub presence: Presence,
    #[serde(default)]
    pub presence_locked: Option<bool>,
    #[serde(default)]
    pub show_home_presence_switch_button: Option<bool>,
    #[serde(default)]
    pub show_switch_to_auto_geofencing_button: Option<bool>,
}

impl HomeState {
    /// The presence the user chose: `Auto` unless presence is locked.
    pub fn presence_setting(&self) -> Presence {
        if self.presence_locked.unwrap_or(false) {
            self.presence
        } else {
            Presence::Auto
        }
    }

    /// Whether the home may switch presence automatically.
    pub fn auto_geofencing_supported(&self) -> bool {
        match (self.show_switch_to_auto_geofencing_button, self.presence_locked) {
            (Some(button), _) => button,
            (None, Some(locked)) => !locked,
            (None, None) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetadata {
    pub platform: String,
    pub os_version: String,
    pub model: String,
    pub locale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileSettings {
    pub geo_tracking_enabled: bool,
    #[serde(default)]
    pub special_offers_enabled: Option<bool>,
    #[serde(default)]
    pub on_demand_log_retrieval_enabled: Option<bool>,
    #[serde(default)]
    pub push_notifications: HashMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearingFromHome {
    pub degrees: f64,
    pub radians: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileLocation {
    pub stale: bool,
    pub at_home: bool,
    pub bearing_from_home: BearingFromHome,
    pub relative_distance_from_home_fence: f64,
}

/// `GET homes/{id}/mobileDevices`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileDevice {
    pub name: String,
    pub id: u64,
    #[serde(default)]
    pub device_metadata: Option<DeviceMetadata>,
    #[serde(default)]
    pub settings: Option<MobileSettings>,
    #[serde(default)]
    pub location: Option<MobileLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Freshness {
    pub value: String,
    #[serde(default)]
    pub last_open_window: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomComfortCoordinate {
    pub radial: f64,
    pub angular: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomComfort {
    pub room_id: u32,
    #[serde(default)]
    pub temperature_level: Option<String>,
    #[serde(default)]
    pub humidity_level: Option<String>,
    #[serde(default)]
    pub coordinate: Option<RoomComfortCoordinate>,
}

/// `GET homes/{id}/airComfort`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirComfort {
    pub freshness: Freshness,
    #[serde(default)]
    pub comfort: Vec<RoomComfort>,
}

/// Offset applied by a device to its temperature sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureOffset {
    pub celsius: f64,
    #[serde(default)]
    pub fahrenheit: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowTemperatureConstraints {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoAdaptation {
    pub enabled: bool,
    #[serde(default)]
    pub max_flow_temperature: Option<f64>,
}

/// Boiler flow temperature limit, served by both generations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowTemperatureOptimization {
    #[serde(default)]
    pub has_multiple_boiler_control_devices: bool,
    pub max_flow_temperature: f64,
    pub max_flow_temperature_constraints: FlowTemperatureConstraints,
    #[serde(default)]
    pub auto_adaptation: Option<AutoAdaptation>,
    #[serde(default)]
    pub open_therm_device_serial_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningTimeZone {
    pub id: u32,
    pub running_time_in_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningTime {
    pub start_time: String,
    pub end_time: String,
    pub running_time_in_seconds: u64,
    #[serde(default)]
    pub zones: Vec<RunningTimeZone>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningTimeSummary {
    pub start_time: String,
    pub end_time: String,
    pub total_running_time_in_seconds: u64,
    pub mean_in_seconds_per_day: u64,
}

/// Heating running times per day, served by the minder service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningTimes {
    pub running_times: Vec<RunningTime>,
    pub summary: RunningTimeSummary,
    #[serde(default)]
    pub last_updated: Option<String>,
}
