//! Route telemetry types
//!
//! Telemetry is the raw material of the analytics pipeline: timestamped
//! position samples grouped into one log per vehicle-day. Samples arrive in
//! roughly chronological order but consumers must not rely on it; the
//! transform sorts before accumulating.

pub mod generator;

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

use crate::coord::GeoPoint;

/// Identity of one vehicle-day of telemetry.
///
/// Ordered so that storage iterates route logs deterministically; the
/// analytics extract relies on that order for stable paging.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteKey {
    pub route_id: String,
    pub driver_id: String,
    pub vehicle_id: String,
    pub date: NaiveDate,
}

impl RouteKey {
    pub fn new(
        route_id: impl Into<String>,
        driver_id: impl Into<String>,
        vehicle_id: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            route_id: route_id.into(),
            driver_id: driver_id.into(),
            vehicle_id: vehicle_id.into(),
            date,
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.route_id, self.driver_id, self.vehicle_id, self.date
        )
    }
}

/// One position fix from a vehicle.
///
/// Speed and heading come from separate sensors and are independently
/// optional; a fix with neither is still useful for distance accumulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    pub timestamp: DateTime<Utc>,
    pub position: GeoPoint,
    pub speed_kmh: Option<f64>,
    pub heading_deg: Option<f64>,
}

impl TelemetrySample {
    /// Creates a position-only sample (no speed or heading sensors).
    pub fn fix(timestamp: DateTime<Utc>, position: GeoPoint) -> Self {
        Self {
            timestamp,
            position,
            speed_kmh: None,
            heading_deg: None,
        }
    }
}

/// All telemetry recorded for one route on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLog {
    pub key: RouteKey,
    pub samples: Vec<TelemetrySample>,
}

impl RouteLog {
    pub fn new(key: RouteKey) -> Self {
        Self {
            key,
            samples: Vec::new(),
        }
    }

    pub fn with_samples(key: RouteKey, samples: Vec<TelemetrySample>) -> Self {
        Self { key, samples }
    }
}
