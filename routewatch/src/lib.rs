//! RouteWatch - shipment fleet simulation and route analytics
//!
//! Tracks a fleet of in-transit shipments: a tick-driven simulation engine
//! advances every route toward its destination and broadcasts live position
//! events, while a chunked analytics pipeline compresses a day of raw
//! telemetry into per-route distance, speed, duration and fuel metrics.
//!
//! # Architecture
//!
//! ```text
//!                         ┌──────────────────┐   PositionEvent
//!   tick timer ─────────► │ SimulationEngine │ ─────────────────► subscribers
//!                         └────────┬─────────┘
//!                                  │ positions, samples
//!                                  ▼
//!            ShipmentStore / TelemetryStore / AnalyticsStore
//!                                  ▲
//!                                  │ route logs, chunk commits
//!                         ┌────────┴─────────┐
//!   trigger ────────────► │ AnalyticsPipeline│
//!                         └──────────────────┘
//! ```
//!
//! Persistence sits behind the async traits in [`store`]; the bundled
//! in-memory implementations carry demos and tests, real backends plug in
//! behind the same traits. [`app::RouteWatchApp`] wires everything together.

pub mod analytics;
pub mod app;
pub mod broadcast;
pub mod coord;
pub mod logging;
pub mod shipment;
pub mod sim;
pub mod store;
pub mod telemetry;

pub use app::{AppConfig, RouteWatchApp};

/// Crate version, from Cargo metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
