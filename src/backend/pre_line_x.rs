//! Backend for pre-X homes (`my.tado.com/api/v2`).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{validate_device_id, validate_zone_id, HomeApi};
use crate::error::{Result, TadoError};
use crate::http::{Action, ApiChannel, ApiRequest};
use crate::models::pre_line_x::{
    Capabilities, Device, HeatingCircuit, MaxOutputTemp, WiringInstallationState,
    Zone as ZoneInfo, ZoneControl, ZoneOverlayDefault, ZoneState,
};
use crate::models::{FlowTemperatureOptimization, TemperatureOffset};
use crate::resolver::Family;
use crate::zone::Zone;

/// Client for homes with classic hardware.
#[derive(Debug, Clone)]
pub struct PreLineXClient {
    channel: Arc<ApiChannel>,
}

impl PreLineXClient {
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

    pub async fn get_capabilities(&self, zone_id: u32) -> Result<Capabilities> {
        fetch_capabilities(&self.channel, validate_zone_id(zone_id)?).await
    }

    pub async fn get_zone_overlay_default(&self, zone_id: u32) -> Result<ZoneOverlayDefault> {
        fetch_overlay_default(&self.channel, validate_zone_id(zone_id)?).await
    }

    pub async fn get_zone_control(&self, zone_id: u32) -> Result<ZoneControl> {
        let zone_id = validate_zone_id(zone_id)?;
        self.channel
            .fetch("zone control", &ApiRequest::home(format!("zones/{zone_id}/control")))
            .await
    }

    /// Move a zone onto another heating circuit.
    pub async fn set_zone_heating_circuit(&self, zone_id: u32, circuit: u32) -> Result<ZoneControl> {
        let zone_id = validate_zone_id(zone_id)?;
        let request = ApiRequest::home(format!("zones/{zone_id}/control/heatingCircuit"))
            .action(Action::Change)
            .payload(json!({ "circuitNumber": circuit }));
        self.channel.fetch("zone control", &request).await
    }

    pub async fn get_heating_circuits(&self) -> Result<Vec<HeatingCircuit>> {
        self.channel
            .fetch("heating circuits", &ApiRequest::home("heatingCircuits"))
            .await
    }

    /// Tell the zone a window was opened.
    pub async fn set_open_window(&self, zone_id: u32) -> Result<()> {
        let zone_id = validate_zone_id(zone_id)?;
        let request = ApiRequest::home(format!("zones/{zone_id}/state/openWindow/activate"))
            .action(Action::Set);
        self.channel.execute(&request).await
    }

    pub async fn reset_open_window(&self, zone_id: u32) -> Result<()> {
        let zone_id = validate_zone_id(zone_id)?;
        let request =
            ApiRequest::home(format!("zones/{zone_id}/state/openWindow")).action(Action::Reset);
        self.channel.execute(&request).await
    }

    pub async fn set_child_lock(&self, device_id: &str, enabled: bool) -> Result<()> {
        let request = ApiRequest::device(validate_device_id(device_id)?, "childLock")
            .action(Action::Change)
            .payload(json!({ "childLockEnabled": enabled }));
        self.channel.execute(&request).await
    }

    pub async fn get_temp_offset(&self, device_id: &str) -> Result<TemperatureOffset> {
        let request = ApiRequest::device(validate_device_id(device_id)?, "temperatureOffset");
        self.channel.fetch("temperature offset", &request).await
    }

    pub async fn set_temp_offset(&self, device_id: &str, celsius: f64) -> Result<TemperatureOffset> {
        if !celsius.is_finite() {
            return Err(TadoError::InvalidArgument(format!(
                "temperature offset must be finite, got {celsius}"
            )));
        }
        let request = ApiRequest::device(validate_device_id(device_id)?, "temperatureOffset")
            .action(Action::Change)
            .payload(json!({ "celsius": celsius }));
        self.channel.fetch("temperature offset", &request).await
    }

    pub async fn get_flow_temperature_optimization(&self) -> Result<FlowTemperatureOptimization> {
        self.channel
            .fetch(
                "flow temperature optimization",
                &ApiRequest::home("flowTemperatureOptimization"),
            )
            .await
    }

    pub async fn set_flow_temperature_optimization(&self, max_flow_temperature: f64) -> Result<()> {
        let request = ApiRequest::home("flowTemperatureOptimization")
            .action(Action::Change)
            .payload(json!({ "maxFlowTemperature": max_flow_temperature }));
        self.channel.execute(&request).await
    }

    /// Wiring state of the boiler behind a bridge. `auth_key` is printed on the bridge.
    pub async fn get_boiler_install_state(
        &self,
        bridge_id: &str,
        auth_key: &str,
    ) -> Result<WiringInstallationState> {
        let request = bridge_request(bridge_id, auth_key, "boilerWiringInstallationState")?;
        self.channel
            .fetch("boiler wiring installation state", &request)
            .await
    }

    pub async fn get_boiler_max_output_temperature(
        &self,
        bridge_id: &str,
        auth_key: &str,
    ) -> Result<MaxOutputTemp> {
        let request = bridge_request(bridge_id, auth_key, "boilerMaxOutputTemperature")?;
        self.channel
            .fetch("boiler max output temperature", &request)
            .await
    }

    pub async fn set_boiler_max_output_temperature(
        &self,
        bridge_id: &str,
        auth_key: &str,
        celsius: f64,
    ) -> Result<()> {
        if !celsius.is_finite() {
            return Err(TadoError::InvalidArgument(format!(
                "boiler output temperature must be finite, got {celsius}"
            )));
        }
        let request = bridge_request(bridge_id, auth_key, "boilerMaxOutputTemperature")?
            .action(Action::Change)
            .payload(json!({ "boilerMaxOutputTemperatureInCelsius": celsius }));
        self.channel.execute(&request).await
    }
}

fn bridge_request(bridge_id: &str, auth_key: &str, command: &str) -> Result<ApiRequest> {
    let auth_key = auth_key.trim();
    if auth_key.is_empty() {
        return Err(TadoError::InvalidArgument(
            "bridge auth key must not be empty".to_string(),
        ));
    }
    Ok(ApiRequest::bridge(validate_device_id(bridge_id)?, command).param("authKey", auth_key))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneStatesResponse {
    zone_states: BTreeMap<String, ZoneState>,
}

#[async_trait]
impl HomeApi for PreLineXClient {
    type Device = Device;
    type ZoneState = ZoneState;
    type Zone = Zone;

    fn family(&self) -> Family {
        Family::PreLineX
    }

    fn channel(&self) -> &Arc<ApiChannel> {
        &self.channel
    }

    async fn get_devices(&self) -> Result<Vec<Device>> {
        self.channel
            .fetch("devices", &ApiRequest::home("devices"))
            .await
    }

    async fn get_zones(&self) -> Result<Vec<Zone>> {
        let zones = fetch_zones(&self.channel).await?;
        Ok(zones
            .into_iter()
            .map(|info| Zone::with_metadata(Arc::clone(&self.channel), info))
            .collect())
    }

    async fn get_zone(&self, zone_id: u32) -> Result<Zone> {
        Ok(Zone::new(Arc::clone(&self.channel), validate_zone_id(zone_id)?))
    }

    async fn get_zone_state(&self, zone_id: u32) -> Result<ZoneState> {
        fetch_zone_state(&self.channel, validate_zone_id(zone_id)?).await
    }

    async fn get_zone_states(&self) -> Result<BTreeMap<u32, ZoneState>> {
        let response: ZoneStatesResponse = self
            .channel
            .fetch("zone states", &ApiRequest::home("zoneStates"))
            .await?;
        response
            .zone_states
            .into_iter()
            .map(|(key, state)| {
                key.parse::<u32>()
                    .map(|id| (id, state))
                    .map_err(|_| TadoError::upstream_schema("zone states", format!("zone key '{key}'")))
            })
            .collect()
    }
}

pub(crate) async fn fetch_zones(channel: &ApiChannel) -> Result<Vec<ZoneInfo>> {
    channel.fetch("zones", &ApiRequest::home("zones")).await
}

pub(crate) async fn fetch_zone_state(channel: &ApiChannel, zone_id: u32) -> Result<ZoneState> {
    channel
        .fetch("zone state", &ApiRequest::home(format!("zones/{zone_id}/state")))
        .await
}

pub(crate) async fn fetch_capabilities(channel: &ApiChannel, zone_id: u32) -> Result<Capabilities> {
    channel
        .fetch(
            "zone capabilities",
            &ApiRequest::home(format!("zones/{zone_id}/capabilities")),
        )
        .await
}

pub(crate) async fn fetch_overlay_default(
    channel: &ApiChannel,
    zone_id: u32,
) -> Result<ZoneOverlayDefault> {
    channel
        .fetch(
            "zone overlay default",
            &ApiRequest::home(format!("zones/{zone_id}/defaultOverlay")),
        )
        .await
}
