//! Position simulation engine
//!
//! Drives every in-transit shipment along a straight line toward its
//! destination on a fixed tick. Movement is planar in degree space: steps
//! are around 100 m, far below the scale where curvature matters, and the
//! arithmetic stays trivially cheap per route.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────────────┐
//!   tick timer ────► │ SimulationEngine │ ──► ShipmentStore (positions, status)
//!                    │  RouteRegistry   │ ──► BroadcastSink (one event per move)
//!                    └──────────────────┘ ──► TelemetryStore (optional samples)
//! ```
//!
//! Routes live only in memory. A restart rebuilds the registry from the
//! store via [`SimulationEngine::initialize`], so simulation resumes from
//! the last persisted positions.

mod engine;
mod registry;
mod route;
pub mod seed;

pub use engine::{SimulationEngine, TickSummary};
pub use registry::RouteRegistry;
pub use route::SimulatedRoute;

use std::time::Duration;

use crate::coord::GeoPoint;

/// Default number of simulated routes kept in transit.
pub const DEFAULT_ROUTE_COUNT: usize = 20;

/// Default simulation tick interval.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Default per-tick step size in degrees (~110 m of latitude).
pub const DEFAULT_STEP_SIZE_DEG: f64 = 0.001;

/// Default depot the fleet spawns around (New Delhi).
pub const DEFAULT_DEPOT: GeoPoint = GeoPoint {
    lat: 28.6139,
    lon: 77.2090,
};

/// Default half-width of the square spawn region, in degrees.
pub const DEFAULT_SPAWN_RADIUS_DEG: f64 = 0.5;

/// Simulation engine settings.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Whether the tick loop runs at all
    pub enabled: bool,
    /// Fleet size the seeder tops the store up to
    pub route_count: usize,
    /// Wall-clock time between ticks
    pub tick_interval: Duration,
    /// Planar step per tick, in degrees
    pub step_size_deg: f64,
    /// Center of the spawn region
    pub depot: GeoPoint,
    /// Half-width of the square spawn region, in degrees
    pub spawn_radius_deg: f64,
    /// Record a telemetry sample for every successful move
    pub record_telemetry: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            route_count: DEFAULT_ROUTE_COUNT,
            tick_interval: DEFAULT_TICK_INTERVAL,
            step_size_deg: DEFAULT_STEP_SIZE_DEG,
            depot: DEFAULT_DEPOT,
            spawn_radius_deg: DEFAULT_SPAWN_RADIUS_DEG,
            record_telemetry: false,
        }
    }
}

impl SimulatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables the tick loop (routes can still be advanced manually).
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_route_count(mut self, count: usize) -> Self {
        self.route_count = count;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_step_size(mut self, degrees: f64) -> Self {
        self.step_size_deg = degrees;
        self
    }

    pub fn with_depot(mut self, depot: GeoPoint) -> Self {
        self.depot = depot;
        self
    }

    pub fn with_spawn_radius(mut self, degrees: f64) -> Self {
        self.spawn_radius_deg = degrees;
        self
    }

    pub fn with_telemetry_recording(mut self, enabled: bool) -> Self {
        self.record_telemetry = enabled;
        self
    }
}
