//! Zone handles with lazily fetched, cached attribute groups.
//!
//! A handle is cheap to create. Reading an attribute fetches the group that
//! serves it once; later reads reuse it until [`ClimateZone::update`].
//! Concurrent first reads of the same group share one request.

pub mod cache;
mod line_x;
mod pre_line_x;

pub use line_x::Room;
pub use pre_line_x::Zone;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{HvacAction, HvacMode, OverlayMode, Power, Presence, ZoneType};

/// Attributes every zone exposes regardless of hardware generation.
#[async_trait]
pub trait ClimateZone: Send + Sync {
    fn id(&self) -> u32;

    /// Mark every cached group stale. The next read of each group refetches.
    fn update(&self);

    async fn name(&self) -> Result<String>;

    async fn zone_type(&self) -> Result<ZoneType>;

    async fn current_temp(&self) -> Result<Option<f64>>;

    async fn target_temp(&self) -> Result<Option<f64>>;

    async fn current_humidity(&self) -> Result<Option<f64>>;

    async fn power(&self) -> Result<Power>;

    async fn open_window(&self) -> Result<bool>;

    async fn open_window_expiry_seconds(&self) -> Result<Option<u64>>;

    async fn current_hvac_mode(&self) -> Result<HvacMode>;

    async fn current_hvac_action(&self) -> Result<HvacAction>;

    async fn heating_power_percentage(&self) -> Result<Option<f64>>;

    /// Whether the zone's hardware is reachable.
    async fn available(&self) -> Result<bool>;

    async fn tado_mode(&self) -> Result<Presence>;

    async fn overlay_termination_type(&self) -> Result<Option<OverlayMode>>;
}

/// A zone of either generation.
#[derive(Debug)]
pub enum ZoneHandle {
    Zone(Zone),
    Room(Room),
}

impl ZoneHandle {
    pub fn as_zone(&self) -> Option<&Zone> {
        match self {
            Self::Zone(zone) => Some(zone),
            Self::Room(_) => None,
        }
    }

    pub fn as_room(&self) -> Option<&Room> {
        match self {
            Self::Room(room) => Some(room),
            Self::Zone(_) => None,
        }
    }

    fn inner(&self) -> &dyn ClimateZone {
        match self {
            Self::Zone(zone) => zone,
            Self::Room(room) => room,
        }
    }
}

impl From<Zone> for ZoneHandle {
    fn from(zone: Zone) -> Self {
        Self::Zone(zone)
    }
}

impl From<Room> for ZoneHandle {
    fn from(room: Room) -> Self {
        Self::Room(room)
    }
}

#[async_trait]
impl ClimateZone for ZoneHandle {
    fn id(&self) -> u32 {
        self.inner().id()
    }

    fn update(&self) {
        self.inner().update()
    }

    async fn name(&self) -> Result<String> {
        self.inner().name().await
    }

    async fn zone_type(&self) -> Result<ZoneType> {
        self.inner().zone_type().await
    }

    async fn current_temp(&self) -> Result<Option<f64>> {
        self.inner().current_temp().await
    }

    async fn target_temp(&self) -> Result<Option<f64>> {
        self.inner().target_temp().await
    }

    async fn current_humidity(&self) -> Result<Option<f64>> {
        self.inner().current_humidity().await
    }

    async fn power(&self) -> Result<Power> {
        self.inner().power().await
    }

    async fn open_window(&self) -> Result<bool> {
        self.inner().open_window().await
    }

    async fn open_window_expiry_seconds(&self) -> Result<Option<u64>> {
        self.inner().open_window_expiry_seconds().await
    }

    async fn current_hvac_mode(&self) -> Result<HvacMode> {
        self.inner().current_hvac_mode().await
    }

    async fn current_hvac_action(&self) -> Result<HvacAction> {
        self.inner().current_hvac_action().await
    }

    async fn heating_power_percentage(&self) -> Result<Option<f64>> {
        self.inner().heating_power_percentage().await
    }

    async fn available(&self) -> Result<bool> {
        self.inner().available().await
    }

    async fn tado_mode(&self) -> Result<Presence> {
        self.inner().tado_mode().await
    }

    async fn overlay_termination_type(&self) -> Result<Option<OverlayMode>> {
        self.inner().overlay_termination_type().await
    }
}
