//! Typed records for both API generations.
//!
//! Shared, home-level records live in [`common`]; [`pre_line_x`] and
//! [`line_x`] hold the zone and device shapes of each generation.
//! [`historic`] holds day reports.

pub mod common;
pub mod historic;
pub mod line_x;
pub mod pre_line_x;
pub mod types;

pub use common::{
    AirComfort, FlowTemperatureOptimization, Home, HomeState, HomeSummary, Humidity,
    MobileDevice, RunningTime, RunningTimeSummary, RunningTimeZone, RunningTimes, Temperature,
    TemperatureOffset, User, Weather,
};
pub use historic::DayReport;
pub use types::{
    BatteryState, ConnectionState, HvacAction, HvacMode, LinkState, OverlayMode, Power, Presence,
    ZoneType,
};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, TadoError};

/// Decode a response body, reporting shape mismatches as upstream schema errors.
pub fn decode<T: DeserializeOwned>(context: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| TadoError::upstream_schema(context, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_failure_names_the_context() {
        let err = decode::<HomeState>("home state", json!({ "presenceLocked": true }))
            .expect_err("presence missing");
        match err {
            TadoError::UpstreamSchema { context, message } => {
                assert_eq!(context, "home state");
                assert!(message.contains("presence"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
