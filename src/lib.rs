//! Async client for the tado° heating cloud API.
//!
//! Authenticates with the OAuth2 device flow, keeps the token fresh, and
//! exposes one model over both hardware generations: classic homes served
//! by `my.tado.com` and tado X homes served by `hops.tado.com`.
//!
//! # Quick Start
//!
//! ```no_run
//! use tado_client::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> tado_client::Result<()> {
//! let config = ClientConfig::builder()
//!     .token_file_path("/tmp/tado_refresh_token.json")
//!     .build();
//! let client = ClientInitializer::new(config)?
//!     .authenticate(&CancellationToken::new())
//!     .await?;
//!
//! for zone in client.get_zones().await? {
//!     println!("{} -> {:?}", zone.name().await?, zone.current_temp().await?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod prelude;
pub mod resolver;
pub mod util;
pub mod zone;

pub use client::{ClientInitializer, TadoClient};
pub use config::ClientConfig;
pub use error::{Result, TadoError};
