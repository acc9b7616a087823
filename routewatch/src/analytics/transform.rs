//! Route log to analytics transform.

use chrono::{DateTime, Utc};

use super::record::RouteAnalytics;
use crate::coord::distance_km;
use crate::telemetry::RouteLog;

/// Divisor relating distance and average speed to a fuel figure.
///
/// `fuel = distance / (avg_speed * 0.1)`, a fleet-calibration heuristic
/// carried over from the operations team's spreadsheet model.
pub const FUEL_EFFICIENCY_FACTOR: f64 = 0.1;

/// Reduces one route log to its analytics record.
///
/// Sample order is untrusted and sorted by timestamp before any pairwise
/// accumulation; a log with shuffled samples produces the same record as a
/// sorted one. Speed statistics only consider samples whose speed sensor
/// reported, and the optional metrics degrade to `None` rather than fake
/// zeros (see [`RouteAnalytics`]).
pub fn summarize_route(log: &RouteLog, processed_at: DateTime<Utc>) -> RouteAnalytics {
    let mut samples = log.samples.clone();
    samples.sort_by_key(|sample| sample.timestamp);

    let total_distance_km: f64 = samples
        .windows(2)
        .map(|pair| distance_km(pair[0].position, pair[1].position))
        .sum();

    let speeds: Vec<f64> = samples.iter().filter_map(|sample| sample.speed_kmh).collect();
    let (avg_speed_kmh, max_speed_kmh) = if speeds.is_empty() {
        (0.0, 0.0)
    } else {
        let avg = speeds.iter().sum::<f64>() / speeds.len() as f64;
        let max = speeds.iter().copied().fold(speeds[0], f64::max);
        (avg, max)
    };

    let duration_minutes = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) if samples.len() > 1 => {
            Some((last.timestamp - first.timestamp).num_minutes())
        }
        _ => None,
    };

    let fuel_efficiency = if total_distance_km > 0.0 && avg_speed_kmh > 0.0 {
        Some(total_distance_km / (avg_speed_kmh * FUEL_EFFICIENCY_FACTOR))
    } else {
        None
    };

    RouteAnalytics {
        route_id: log.key.route_id.clone(),
        date: log.key.date,
        total_distance_km,
        avg_speed_kmh,
        max_speed_kmh,
        duration_minutes,
        fuel_efficiency,
        stop_count: 0,
        deliveries_completed: 0,
        deliveries_failed: 0,
        processed_at,
    }
}
