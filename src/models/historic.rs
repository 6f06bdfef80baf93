//! Day reports (`zones/{id}/dayReport`).
//!
//! A report is a set of time series over one day. Point series carry
//! timestamped samples; interval series carry values valid from one instant
//! to the next.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::TempPrecision;
use super::types::{Power, ZoneType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInterval {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataInterval<T> {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint<T> {
    pub timestamp: DateTime<Utc>,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalSeries<T> {
    pub time_series_type: String,
    pub value_type: String,
    #[serde(default = "Vec::new")]
    pub data_intervals: Vec<DataInterval<T>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointSeries<T> {
    pub time_series_type: String,
    pub value_type: String,
    #[serde(default = "Vec::new")]
    pub data_points: Vec<DataPoint<T>>,
    #[serde(default = "Option::default")]
    pub min: Option<T>,
    #[serde(default = "Option::default")]
    pub max: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasuredData {
    pub measuring_device_connected: IntervalSeries<bool>,
    pub inside_temperature: PointSeries<TempPrecision>,
    pub humidity: PointSeries<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSetting {
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    pub power: Power,
    #[serde(default)]
    pub temperature: Option<TempPrecision>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stripe {
    pub stripe_type: String,
    #[serde(default)]
    pub setting: Option<ReportSetting>,
}

/// One day of measurements, settings and weather for a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayReport {
    pub zone_type: ZoneType,
    pub interval: ReportInterval,
    pub hours_in_day: u8,
    pub measured_data: MeasuredData,
    pub stripes: IntervalSeries<Stripe>,
    pub settings: IntervalSeries<Option<ReportSetting>>,
    pub call_for_heat: IntervalSeries<String>,
    /// Condition, sunshine and slot series; kept raw.
    #[serde(default)]
    pub weather: Value,
}

impl DayReport {
    /// Inside temperature samples in Celsius, in report order.
    pub fn inside_temperatures(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.measured_data
            .inside_temperature
            .data_points
            .iter()
            .map(|point| (point.timestamp, point.value.celsius))
    }
}
