//! Derived analytics record.

use chrono::{DateTime, NaiveDate, Utc};

/// Aggregated metrics for one route on one day.
///
/// `duration_minutes` and `fuel_efficiency` stay `None` when the underlying
/// telemetry cannot support them (fewer than two samples, or no positive
/// distance/speed); zero would be a lie the dashboards downstream cannot
/// distinguish from a real measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteAnalytics {
    pub route_id: String,
    pub date: NaiveDate,
    pub total_distance_km: f64,
    pub avg_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub duration_minutes: Option<i64>,
    pub fuel_efficiency: Option<f64>,
    /// Stops are not derivable from position telemetry alone; reserved
    /// for enrichment from delivery events
    pub stop_count: u32,
    pub deliveries_completed: u32,
    pub deliveries_failed: u32,
    pub processed_at: DateTime<Utc>,
}

impl RouteAnalytics {
    /// A zeroed record, the shape produced for a route with no usable
    /// telemetry.
    pub fn empty(route_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            route_id: route_id.into(),
            date,
            total_distance_km: 0.0,
            avg_speed_kmh: 0.0,
            max_speed_kmh: 0.0,
            duration_minutes: None,
            fuel_efficiency: None,
            stop_count: 0,
            deliveries_completed: 0,
            deliveries_failed: 0,
            processed_at: Utc::now(),
        }
    }
}
