//! Convenience re-exports for common use.

pub use crate::auth::{DeviceAuthSession, DeviceFlowStatus, TokenStore};
pub use crate::backend::{HomeApi, LineXClient, PreLineXClient};
pub use crate::client::{Backend, ClientInitializer, DeviceRecord, TadoClient, ZoneStateRecord};
pub use crate::config::ClientConfig;
pub use crate::error::{Result, TadoError};
pub use crate::models::{HvacAction, HvacMode, Power, Presence, ZoneType};
pub use crate::resolver::Family;
pub use crate::zone::{ClimateZone, ZoneHandle};
