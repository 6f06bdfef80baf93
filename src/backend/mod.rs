//! The two API backends and the contract they share.
//!
//! [`HomeApi`] covers what both generations can do. Anything only one
//! generation supports is an inherent method of [`PreLineXClient`] or
//! [`LineXClient`], so calling it on the wrong family does not compile.

pub mod line_x;
pub mod pre_line_x;

pub use line_x::LineXClient;
pub use pre_line_x::PreLineXClient;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;

use crate::error::{Result, TadoError};
use crate::http::{Action, ApiChannel, ApiRequest};
use crate::models::{
    AirComfort, DayReport, HomeState, MobileDevice, Presence, RunningTimes, User, Weather,
};
use crate::resolver::Family;

#[async_trait]
pub trait HomeApi: Send + Sync {
    type Device: Send;
    type ZoneState: Send;
    type Zone: Send;

    fn family(&self) -> Family;

    fn channel(&self) -> &Arc<ApiChannel>;

    async fn get_devices(&self) -> Result<Vec<Self::Device>>;

    /// Zone handles in the order the vendor lists them.
    async fn get_zones(&self) -> Result<Vec<Self::Zone>>;

    /// A lazy handle; nothing is fetched until an attribute is read.
    async fn get_zone(&self, zone_id: u32) -> Result<Self::Zone>;

    async fn get_zone_state(&self, zone_id: u32) -> Result<Self::ZoneState>;

    /// States of every zone keyed by zone id.
    async fn get_zone_states(&self) -> Result<BTreeMap<u32, Self::ZoneState>>;

    async fn get_me(&self) -> Result<User> {
        self.channel().fetch("me", &ApiRequest::me()).await
    }

    async fn get_home_state(&self) -> Result<HomeState> {
        fetch_home_state(self.channel()).await
    }

    async fn get_auto_geofencing_supported(&self) -> Result<bool> {
        Ok(self.get_home_state().await?.auto_geofencing_supported())
    }

    async fn set_home(&self) -> Result<()> {
        self.change_presence(Presence::Home).await
    }

    async fn set_away(&self) -> Result<()> {
        self.change_presence(Presence::Away).await
    }

    /// Lock presence to `Home` or `Away`.
    async fn change_presence(&self, presence: Presence) -> Result<()> {
        if !matches!(presence, Presence::Home | Presence::Away) {
            return Err(TadoError::InvalidArgument(format!(
                "presence can only be locked to HOME or AWAY, got {presence}"
            )));
        }
        let request = ApiRequest::home("presenceLock")
            .action(Action::Change)
            .payload(json!({ "homePresence": presence }));
        self.channel().execute(&request).await
    }

    async fn get_weather(&self) -> Result<Weather> {
        self.channel()
            .fetch("weather", &ApiRequest::home("weather"))
            .await
    }

    async fn get_air_comfort(&self) -> Result<AirComfort> {
        self.channel()
            .fetch("air comfort", &ApiRequest::home("airComfort"))
            .await
    }

    async fn get_users(&self) -> Result<Vec<User>> {
        self.channel()
            .fetch("users", &ApiRequest::home("users"))
            .await
    }

    async fn get_mobile_devices(&self) -> Result<Vec<MobileDevice>> {
        self.channel()
            .fetch("mobile devices", &ApiRequest::home("mobileDevices"))
            .await
    }

    /// Daily heating running times starting at `from`.
    async fn get_running_times(&self, from: NaiveDate) -> Result<RunningTimes> {
        let request =
            ApiRequest::minder("runningTimes").param("from", from.format("%Y-%m-%d").to_string());
        self.channel().fetch("running times", &request).await
    }

    /// Measurements and settings of one zone over one day.
    async fn get_historic(&self, zone_id: u32, date: NaiveDate) -> Result<DayReport> {
        let zone_id = validate_zone_id(zone_id)?;
        let request = ApiRequest::home(format!("zones/{zone_id}/dayReport"))
            .param("date", date.format("%Y-%m-%d").to_string());
        self.channel().fetch("day report", &request).await
    }
}

pub(crate) async fn fetch_home_state(channel: &ApiChannel) -> Result<HomeState> {
    channel.fetch("home state", &ApiRequest::home("state")).await
}

/// Zone and room ids start at 1.
pub(crate) fn validate_zone_id(zone_id: u32) -> Result<u32> {
    if zone_id == 0 {
        return Err(TadoError::InvalidArgument(
            "zone id must be positive".to_string(),
        ));
    }
    Ok(zone_id)
}

pub(crate) fn validate_device_id(device_id: &str) -> Result<&str> {
    let trimmed = device_id.trim();
    if trimmed.is_empty() || trimmed.contains('/') {
        return Err(TadoError::InvalidArgument(format!(
            "invalid device serial '{device_id}'"
        )));
    }
    Ok(trimmed)
}
