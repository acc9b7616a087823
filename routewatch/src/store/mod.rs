//! Store trait definitions
//!
//! Persistence sits behind narrow async traits so the engine and the
//! analytics pipeline never know what is underneath — the bundled in-memory
//! implementations for tests and demos, or a real database adapter.
//!
//! # Architecture
//!
//! ```text
//! SimulationEngine ──► ShipmentStore ───┐
//!                  ──► TelemetryStore ──┼──► memory::* (DashMap / RwLock)
//! AnalyticsPipeline ─► TelemetryStore ──┤        or external adapters
//!                  ──► AnalyticsStore ──┘
//! ```
//!
//! The traits are dyn-compatible: methods return [`BoxFuture`] rather than
//! using `async fn`, so collaborators hold `Arc<dyn ShipmentStore>` and
//! tests substitute mocks freely.

pub mod memory;

pub use memory::{MemoryAnalyticsStore, MemoryShipmentStore, MemoryTelemetryStore};

use chrono::NaiveDate;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

use crate::analytics::RouteAnalytics;
use crate::coord::GeoPoint;
use crate::shipment::{Shipment, ShipmentId, ShipmentStatus};
use crate::telemetry::{RouteKey, RouteLog, TelemetrySample};

/// Boxed future type alias for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced shipment does not exist
    #[error("Shipment not found: {0}")]
    NotFound(ShipmentId),

    /// A status write would move a terminal shipment backwards
    #[error("Illegal status transition: {from} -> {to}")]
    InvalidTransition {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },

    /// Backend-specific failure (connection loss, write rejection, ...)
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Persistent shipment records keyed by id.
pub trait ShipmentStore: Send + Sync {
    /// Inserts or replaces a shipment record.
    fn insert(&self, shipment: Shipment) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Fetches one shipment by id.
    fn get(&self, id: &ShipmentId) -> BoxFuture<'_, Result<Option<Shipment>, StoreError>>;

    /// Fetches one shipment by its public tracking number.
    fn find_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> BoxFuture<'_, Result<Option<Shipment>, StoreError>>;

    /// Lists every shipment currently in the given status.
    fn list_by_status(
        &self,
        status: ShipmentStatus,
    ) -> BoxFuture<'_, Result<Vec<Shipment>, StoreError>>;

    /// Writes a new current position and refreshes `updated_at`.
    fn update_position(
        &self,
        id: &ShipmentId,
        position: GeoPoint,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Moves a shipment to a new status.
    ///
    /// Implementations must enforce lifecycle monotonicity: a terminal
    /// status only accepts the idempotent re-set of itself, anything else
    /// fails with [`StoreError::InvalidTransition`].
    fn set_status(
        &self,
        id: &ShipmentId,
        status: ShipmentStatus,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Counts shipments in the given status.
    fn count_by_status(&self, status: ShipmentStatus)
        -> BoxFuture<'_, Result<usize, StoreError>>;

    /// Deletes a shipment record. Returns whether it existed.
    fn remove(&self, id: &ShipmentId) -> BoxFuture<'_, Result<bool, StoreError>>;
}

/// Raw telemetry, grouped one log per [`RouteKey`].
pub trait TelemetryStore: Send + Sync {
    /// Appends a single sample, creating the log for its key if needed.
    fn append_sample(
        &self,
        key: RouteKey,
        sample: TelemetrySample,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Bulk-appends full logs, merging samples into existing keys.
    fn append_logs(&self, logs: Vec<RouteLog>) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Reads one page of logs for a date.
    ///
    /// Pages are stable: repeated reads at the same offset see the same
    /// logs in the same [`RouteKey`] order, which is what lets the
    /// analytics pipeline resume from a cursor after a failed run.
    fn read_page(
        &self,
        date: NaiveDate,
        offset: usize,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<RouteLog>, StoreError>>;

    /// Number of route logs recorded for a date.
    fn count_for_date(&self, date: NaiveDate) -> BoxFuture<'_, Result<usize, StoreError>>;

    /// Removes all telemetry.
    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Derived per-route-per-day analytics records.
pub trait AnalyticsStore: Send + Sync {
    /// Upserts a batch of records keyed on (route id, date).
    ///
    /// The batch is the pipeline's unit of commit; implementations should
    /// apply it atomically where the backend allows.
    fn write_batch(&self, records: Vec<RouteAnalytics>) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Fetches the record for one route on one date.
    fn get(
        &self,
        route_id: &str,
        date: NaiveDate,
    ) -> BoxFuture<'_, Result<Option<RouteAnalytics>, StoreError>>;

    /// Lists all records for a date, ordered by route id.
    fn list_for_date(
        &self,
        date: NaiveDate,
    ) -> BoxFuture<'_, Result<Vec<RouteAnalytics>, StoreError>>;

    /// Total number of stored records across all dates.
    fn count(&self) -> BoxFuture<'_, Result<usize, StoreError>>;
}
