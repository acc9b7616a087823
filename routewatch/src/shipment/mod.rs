//! Shipment domain types
//!
//! A shipment is the tracked unit of work: a parcel with an origin, an
//! optional destination, a live position and a delivery lifecycle status.
//! The simulation engine and the stores both speak in these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::coord::GeoPoint;

/// Opaque shipment identifier.
///
/// Caller-supplied (UUID-shaped in practice); the crate only ever hashes,
/// compares and prints it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShipmentId(String);

impl ShipmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Delivery lifecycle of a shipment.
///
/// `Delivered`, `Failed` and `Returned` are terminal: once reached, the
/// status never moves again (stores enforce this, see
/// [`crate::store::StoreError::InvalidTransition`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Pending,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Failed,
    Returned,
}

impl ShipmentStatus {
    /// Whether this status is final.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ShipmentStatus::Delivered | ShipmentStatus::Failed | ShipmentStatus::Returned
        )
    }

    /// Whether a transition to `next` is allowed.
    ///
    /// Any non-terminal status may move anywhere (the external lifecycle
    /// owner decides ordering); a terminal status only permits the
    /// idempotent re-set of itself.
    pub fn can_transition_to(&self, next: ShipmentStatus) -> bool {
        *self == next || !self.is_terminal()
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShipmentStatus::Pending => "PENDING",
            ShipmentStatus::PickedUp => "PICKED_UP",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Failed => "FAILED",
            ShipmentStatus::Returned => "RETURNED",
        };
        f.write_str(s)
    }
}

/// Handling priority assigned at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// A tracked shipment record.
///
/// `current_position` and `destination` are optional: a shipment exists
/// before it is routed, and operators can clear a destination mid-flight.
/// The simulation engine treats both as liveness signals (see `sim`).
#[derive(Debug, Clone, PartialEq)]
pub struct Shipment {
    pub id: ShipmentId,
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub origin: GeoPoint,
    pub current_position: Option<GeoPoint>,
    pub destination: Option<GeoPoint>,
    pub assigned_driver: Option<String>,
    pub assigned_vehicle: Option<String>,
    pub weight_kg: f64,
    pub priority: Priority,
    pub recipient_name: Option<String>,
    pub recipient_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shipment {
    /// Creates a new pending shipment sitting at its origin.
    pub fn new(id: ShipmentId, tracking_number: impl Into<String>, origin: GeoPoint) -> Self {
        let now = Utc::now();
        Self {
            id,
            tracking_number: tracking_number.into(),
            status: ShipmentStatus::Pending,
            origin,
            current_position: Some(origin),
            destination: None,
            assigned_driver: None,
            assigned_vehicle: None,
            weight_kg: 0.0,
            priority: Priority::Medium,
            recipient_name: None,
            recipient_address: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the destination, returning self for chained construction.
    pub fn with_destination(mut self, destination: GeoPoint) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Sets the initial status, returning self for chained construction.
    pub fn with_status(mut self, status: ShipmentStatus) -> Self {
        self.status = status;
        self
    }

    /// Assigns a driver and vehicle, returning self for chained construction.
    pub fn with_assignment(
        mut self,
        driver: impl Into<String>,
        vehicle: impl Into<String>,
    ) -> Self {
        self.assigned_driver = Some(driver.into());
        self.assigned_vehicle = Some(vehicle.into());
        self
    }

    /// Whether the simulation engine may drive this shipment: it must be
    /// in transit with a known position and destination.
    pub fn is_simulatable(&self) -> bool {
        self.status == ShipmentStatus::InTransit
            && self.current_position.is_some()
            && self.destination.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint { lat, lon }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(ShipmentStatus::Delivered.is_terminal());
        assert!(ShipmentStatus::Failed.is_terminal());
        assert!(ShipmentStatus::Returned.is_terminal());

        assert!(!ShipmentStatus::Pending.is_terminal());
        assert!(!ShipmentStatus::PickedUp.is_terminal());
        assert!(!ShipmentStatus::InTransit.is_terminal());
        assert!(!ShipmentStatus::OutForDelivery.is_terminal());
    }

    #[test]
    fn test_non_terminal_may_move_anywhere() {
        assert!(ShipmentStatus::Pending.can_transition_to(ShipmentStatus::InTransit));
        assert!(ShipmentStatus::InTransit.can_transition_to(ShipmentStatus::Delivered));
        // Backwards moves between non-terminal states are the lifecycle
        // owner's business, not ours
        assert!(ShipmentStatus::OutForDelivery.can_transition_to(ShipmentStatus::InTransit));
    }

    #[test]
    fn test_terminal_rejects_regression() {
        assert!(!ShipmentStatus::Delivered.can_transition_to(ShipmentStatus::InTransit));
        assert!(!ShipmentStatus::Failed.can_transition_to(ShipmentStatus::Pending));
        assert!(!ShipmentStatus::Returned.can_transition_to(ShipmentStatus::Delivered));
    }

    #[test]
    fn test_terminal_allows_idempotent_reset() {
        assert!(ShipmentStatus::Delivered.can_transition_to(ShipmentStatus::Delivered));
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&ShipmentStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"OUT_FOR_DELIVERY\"");

        let parsed: ShipmentStatus = serde_json::from_str("\"IN_TRANSIT\"").unwrap();
        assert_eq!(parsed, ShipmentStatus::InTransit);
    }

    #[test]
    fn test_status_display_matches_wire_format() {
        assert_eq!(ShipmentStatus::PickedUp.to_string(), "PICKED_UP");
        assert_eq!(ShipmentStatus::Delivered.to_string(), "DELIVERED");
    }

    #[test]
    fn test_new_shipment_sits_at_origin() {
        let origin = point(28.6139, 77.2090);
        let s = Shipment::new(ShipmentId::new("s-1"), "RW-2026-000001", origin);

        assert_eq!(s.status, ShipmentStatus::Pending);
        assert_eq!(s.current_position, Some(origin));
        assert_eq!(s.destination, None);
        assert_eq!(s.tracking_number, "RW-2026-000001");
    }

    #[test]
    fn test_is_simulatable_requires_transit_and_endpoints() {
        let origin = point(28.0, 77.0);
        let dest = point(28.5, 77.5);

        let pending = Shipment::new(ShipmentId::new("s-1"), "RW-2026-000001", origin)
            .with_destination(dest);
        assert!(!pending.is_simulatable(), "Pending shipments do not move");

        let in_transit = pending.clone().with_status(ShipmentStatus::InTransit);
        assert!(in_transit.is_simulatable());

        let mut no_dest = in_transit.clone();
        no_dest.destination = None;
        assert!(!no_dest.is_simulatable());

        let mut no_pos = in_transit;
        no_pos.current_position = None;
        assert!(!no_pos.is_simulatable());
    }

    #[test]
    fn test_shipment_id_display() {
        let id = ShipmentId::new("abc-123");
        assert_eq!(id.to_string(), "abc-123");
        assert_eq!(id.as_str(), "abc-123");
    }
}
