//! Application wiring
//!
//! Pulls the simulation engine, the broadcast channels and the analytics
//! launcher together behind one start/shutdown surface, with configuration
//! loaded from defaults plus an optional INI file.
//!
//! # Architecture
//!
//! ```text
//! AppConfig ──► RouteWatchApp::start
//!                 ├─ seed_fleet          (ShipmentStore)
//!                 ├─ SimulationEngine    (daemon task, CancellationToken)
//!                 ├─ PositionChannel     (global + per-shipment feeds)
//!                 └─ AnalyticsLauncher   (on-demand pipeline runs)
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::RouteWatchApp;
pub use config::{AppConfig, ConfigFileError, DEFAULT_BROADCAST_CAPACITY};
pub use error::AppError;
