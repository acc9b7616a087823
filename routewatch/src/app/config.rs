//! Application configuration.
//!
//! `AppConfig` is the top-level settings surface passed to
//! [`RouteWatchApp::start`](super::RouteWatchApp::start). Defaults come from
//! the component configs; an optional INI file overlays them section by
//! section.

use ini::Ini;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::analytics::AnalyticsConfig;
use crate::coord::GeoPoint;
use crate::sim::SimulatorConfig;

/// Default per-channel broadcast ring capacity.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the config file
    #[error("Failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// A key was present but its value could not be used
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub simulator: SimulatorConfig,
    pub analytics: AnalyticsConfig,
    /// Events retained per broadcast channel for slow consumers
    pub broadcast_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            analytics: AnalyticsConfig::default(),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simulator(mut self, simulator: SimulatorConfig) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn with_analytics(mut self, analytics: AnalyticsConfig) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Loads configuration from an INI file, overlaying the defaults.
    ///
    /// A missing file yields defaults; a present file only overrides the
    /// keys it names. Recognized sections are `[simulator]`, `[analytics]`
    /// and `[broadcast]`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigFileError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("simulator")) {
            if let Some(v) = section.get("enabled") {
                config.simulator.enabled =
                    parse_value("simulator", "enabled", v, "must be 'true' or 'false'")?;
            }
            if let Some(v) = section.get("route_count") {
                config.simulator.route_count =
                    parse_value("simulator", "route_count", v, "must be a non-negative integer")?;
            }
            if let Some(v) = section.get("tick_interval_ms") {
                let millis: u64 = parse_value(
                    "simulator",
                    "tick_interval_ms",
                    v,
                    "must be a positive integer (milliseconds)",
                )?;
                if millis == 0 {
                    return Err(invalid(
                        "simulator",
                        "tick_interval_ms",
                        v,
                        "must be a positive integer (milliseconds)",
                    ));
                }
                config.simulator.tick_interval = Duration::from_millis(millis);
            }
            if let Some(v) = section.get("step_size_deg") {
                let step: f64 = parse_value(
                    "simulator",
                    "step_size_deg",
                    v,
                    "must be a positive number (degrees)",
                )?;
                if !step.is_finite() || step <= 0.0 {
                    return Err(invalid(
                        "simulator",
                        "step_size_deg",
                        v,
                        "must be a positive number (degrees)",
                    ));
                }
                config.simulator.step_size_deg = step;
            }
            let depot_lat = section.get("depot_lat");
            let depot_lon = section.get("depot_lon");
            if depot_lat.is_some() || depot_lon.is_some() {
                let lat: f64 = match depot_lat {
                    Some(v) => parse_value("simulator", "depot_lat", v, "must be a number")?,
                    None => config.simulator.depot.lat,
                };
                let lon: f64 = match depot_lon {
                    Some(v) => parse_value("simulator", "depot_lon", v, "must be a number")?,
                    None => config.simulator.depot.lon,
                };
                config.simulator.depot = GeoPoint::new(lat, lon).map_err(|e| invalid(
                    "simulator",
                    "depot_lat/depot_lon",
                    &format!("{}, {}", lat, lon),
                    &e.to_string(),
                ))?;
            }
            if let Some(v) = section.get("spawn_radius_deg") {
                config.simulator.spawn_radius_deg = parse_value(
                    "simulator",
                    "spawn_radius_deg",
                    v,
                    "must be a non-negative number (degrees)",
                )?;
            }
            if let Some(v) = section.get("record_telemetry") {
                config.simulator.record_telemetry =
                    parse_value("simulator", "record_telemetry", v, "must be 'true' or 'false'")?;
            }
        }

        if let Some(section) = ini.section(Some("analytics")) {
            if let Some(v) = section.get("chunk_size") {
                let chunk_size: usize =
                    parse_value("analytics", "chunk_size", v, "must be a positive integer")?;
                if chunk_size == 0 {
                    return Err(invalid(
                        "analytics",
                        "chunk_size",
                        v,
                        "must be a positive integer",
                    ));
                }
                config.analytics.chunk_size = chunk_size;
            }
        }

        if let Some(section) = ini.section(Some("broadcast")) {
            if let Some(v) = section.get("capacity") {
                let capacity: usize =
                    parse_value("broadcast", "capacity", v, "must be a positive integer")?;
                if capacity == 0 {
                    return Err(invalid("broadcast", "capacity", v, "must be a positive integer"));
                }
                config.broadcast_capacity = capacity;
            }
        }

        Ok(config)
    }
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
