//! Fleet seeding
//!
//! Tops the shipment store up to the configured fleet size with randomized
//! in-transit shipments scattered around the depot. Seeding is an idempotent
//! top-up keyed on the live in-transit count, so restarting a demo against a
//! warm store does not double the fleet.

use rand::Rng;
use tracing::{debug, info};

use super::SimulatorConfig;
use crate::coord::{GeoPoint, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use crate::shipment::{Priority, Shipment, ShipmentId, ShipmentStatus};
use crate::store::{ShipmentStore, StoreError};

/// Size of the rotating driver pool.
pub const DRIVER_POOL: usize = 20;

/// Size of the rotating vehicle pool.
pub const VEHICLE_POOL: usize = 50;

/// Tops the store up to `config.route_count` in-transit shipments.
///
/// Returns the number of shipments created (zero when the fleet is already
/// at size). Pass a seeded rng for reproducible fleets.
pub async fn seed_fleet(
    store: &dyn ShipmentStore,
    config: &SimulatorConfig,
    rng: &mut impl Rng,
) -> Result<usize, StoreError> {
    let existing = store.count_by_status(ShipmentStatus::InTransit).await?;
    if existing >= config.route_count {
        debug!(existing, "Fleet already at size; nothing to seed");
        return Ok(0);
    }

    let needed = config.route_count - existing;
    for i in 0..needed {
        let shipment = simulated_shipment(existing + i + 1, config, rng);
        store.insert(shipment).await?;
    }

    info!(seeded = needed, fleet = config.route_count, "Fleet seeded");
    Ok(needed)
}

/// Builds one randomized in-transit shipment.
///
/// `sequence` drives the tracking number and the driver/vehicle pool
/// rotation; origin and destination scatter uniformly over the spawn square.
pub fn simulated_shipment(
    sequence: usize,
    config: &SimulatorConfig,
    rng: &mut impl Rng,
) -> Shipment {
    let origin = scatter(config.depot, config.spawn_radius_deg, rng);
    let destination = scatter(config.depot, config.spawn_radius_deg, rng);

    let mut shipment = Shipment::new(
        ShipmentId::new(format!("sim-{:06}", sequence)),
        format!("RW-2026-{:06}", sequence),
        origin,
    )
    .with_destination(destination)
    .with_status(ShipmentStatus::InTransit)
    .with_assignment(
        format!("driver-{}", (sequence - 1) % DRIVER_POOL + 1),
        format!("vehicle-{}", (sequence - 1) % VEHICLE_POOL + 1),
    );

    shipment.weight_kg = rng.gen_range(0.5..10.5);
    shipment.priority = if rng.gen_bool(0.5) {
        Priority::High
    } else {
        Priority::Medium
    };
    shipment.recipient_name = Some(format!("Consignee {}", sequence));
    shipment.recipient_address = Some(format!("{} Depot Road", sequence));
    shipment
}

/// Uniform point in the square around `center`, clamped to valid ranges.
fn scatter(center: GeoPoint, radius_deg: f64, rng: &mut impl Rng) -> GeoPoint {
    GeoPoint {
        lat: (center.lat + rng.gen_range(-radius_deg..=radius_deg)).clamp(MIN_LAT, MAX_LAT),
        lon: (center.lon + rng.gen_range(-radius_deg..=radius_deg)).clamp(MIN_LON, MAX_LON),
    }
}
