//! In-memory store implementations
//!
//! Concurrent map-backed stores used by tests, the CLI demo and any embedder
//! that does not need durability. Shipments and analytics live in `DashMap`
//! (point lookups from many tasks); telemetry lives in nested `BTreeMap`s
//! behind a `parking_lot::RwLock` because the analytics extract needs a
//! stable iteration order, which hash maps cannot give.
//!
//! All methods complete synchronously and return already-resolved futures;
//! no lock is ever held across an await point.

use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{
    AnalyticsStore, BoxFuture, ShipmentStore, StoreError, TelemetryStore,
};
use crate::analytics::RouteAnalytics;
use crate::coord::GeoPoint;
use crate::shipment::{Shipment, ShipmentId, ShipmentStatus};
use crate::telemetry::{RouteKey, RouteLog, TelemetrySample};

// ============================================================================
// Shipments
// ============================================================================

/// Shipment records in a concurrent map.
#[derive(Default)]
pub struct MemoryShipmentStore {
    shipments: DashMap<ShipmentId, Shipment>,
}

impl MemoryShipmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShipmentStore for MemoryShipmentStore {
    fn insert(&self, shipment: Shipment) -> BoxFuture<'_, Result<(), StoreError>> {
        self.shipments.insert(shipment.id.clone(), shipment);
        Box::pin(async { Ok(()) })
    }

    fn get(&self, id: &ShipmentId) -> BoxFuture<'_, Result<Option<Shipment>, StoreError>> {
        let found = self.shipments.get(id).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn find_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> BoxFuture<'_, Result<Option<Shipment>, StoreError>> {
        let found = self
            .shipments
            .iter()
            .find(|entry| entry.value().tracking_number == tracking_number)
            .map(|entry| entry.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn list_by_status(
        &self,
        status: ShipmentStatus,
    ) -> BoxFuture<'_, Result<Vec<Shipment>, StoreError>> {
        let mut matches: Vec<Shipment> = self
            .shipments
            .iter()
            .filter(|entry| entry.value().status == status)
            .map(|entry| entry.value().clone())
            .collect();
        // DashMap iteration order is arbitrary; sort for deterministic callers
        matches.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Box::pin(async move { Ok(matches) })
    }

    fn update_position(
        &self,
        id: &ShipmentId,
        position: GeoPoint,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        let result = match self.shipments.get_mut(id) {
            Some(mut entry) => {
                let shipment = entry.value_mut();
                shipment.current_position = Some(position);
                shipment.updated_at = Utc::now();
                Ok(())
            }
            None => Err(StoreError::NotFound(id.clone())),
        };
        Box::pin(async move { result })
    }

    fn set_status(
        &self,
        id: &ShipmentId,
        status: ShipmentStatus,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        let result = match self.shipments.get_mut(id) {
            Some(mut entry) => {
                let shipment = entry.value_mut();
                if !shipment.status.can_transition_to(status) {
                    Err(StoreError::InvalidTransition {
                        from: shipment.status,
                        to: status,
                    })
                } else {
                    shipment.status = status;
                    shipment.updated_at = Utc::now();
                    Ok(())
                }
            }
            None => Err(StoreError::NotFound(id.clone())),
        };
        Box::pin(async move { result })
    }

    fn count_by_status(
        &self,
        status: ShipmentStatus,
    ) -> BoxFuture<'_, Result<usize, StoreError>> {
        let count = self
            .shipments
            .iter()
            .filter(|entry| entry.value().status == status)
            .count();
        Box::pin(async move { Ok(count) })
    }

    fn remove(&self, id: &ShipmentId) -> BoxFuture<'_, Result<bool, StoreError>> {
        let removed = self.shipments.remove(id).is_some();
        Box::pin(async move { Ok(removed) })
    }
}

// ============================================================================
// Telemetry
// ============================================================================

/// Telemetry logs in date-then-key ordered maps.
#[derive(Default)]
pub struct MemoryTelemetryStore {
    days: RwLock<BTreeMap<NaiveDate, BTreeMap<RouteKey, RouteLog>>>,
}

impl MemoryTelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TelemetryStore for MemoryTelemetryStore {
    fn append_sample(
        &self,
        key: RouteKey,
        sample: TelemetrySample,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        {
            let mut days = self.days.write();
            let logs = days.entry(key.date).or_default();
            logs.entry(key.clone())
                .or_insert_with(|| RouteLog::new(key))
                .samples
                .push(sample);
        }
        Box::pin(async { Ok(()) })
    }

    fn append_logs(&self, logs: Vec<RouteLog>) -> BoxFuture<'_, Result<(), StoreError>> {
        {
            let mut days = self.days.write();
            for log in logs {
                let day = days.entry(log.key.date).or_default();
                day.entry(log.key.clone())
                    .or_insert_with(|| RouteLog::new(log.key.clone()))
                    .samples
                    .extend(log.samples);
            }
        }
        Box::pin(async { Ok(()) })
    }

    fn read_page(
        &self,
        date: NaiveDate,
        offset: usize,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<RouteLog>, StoreError>> {
        let page: Vec<RouteLog> = match self.days.read().get(&date) {
            Some(day) => day.values().skip(offset).take(limit).cloned().collect(),
            None => Vec::new(),
        };
        Box::pin(async move { Ok(page) })
    }

    fn count_for_date(&self, date: NaiveDate) -> BoxFuture<'_, Result<usize, StoreError>> {
        let count = self.days.read().get(&date).map_or(0, |day| day.len());
        Box::pin(async move { Ok(count) })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        self.days.write().clear();
        Box::pin(async { Ok(()) })
    }
}

// ============================================================================
// Analytics
// ============================================================================

/// Analytics records keyed on (route id, date).
#[derive(Default)]
pub struct MemoryAnalyticsStore {
    records: DashMap<(String, NaiveDate), RouteAnalytics>,
}

impl MemoryAnalyticsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnalyticsStore for MemoryAnalyticsStore {
    fn write_batch(&self, records: Vec<RouteAnalytics>) -> BoxFuture<'_, Result<(), StoreError>> {
        for record in records {
            self.records
                .insert((record.route_id.clone(), record.date), record);
        }
        Box::pin(async { Ok(()) })
    }

    fn get(
        &self,
        route_id: &str,
        date: NaiveDate,
    ) -> BoxFuture<'_, Result<Option<RouteAnalytics>, StoreError>> {
        let found = self
            .records
            .get(&(route_id.to_string(), date))
            .map(|entry| entry.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn list_for_date(
        &self,
        date: NaiveDate,
    ) -> BoxFuture<'_, Result<Vec<RouteAnalytics>, StoreError>> {
        let mut matches: Vec<RouteAnalytics> = self
            .records
            .iter()
            .filter(|entry| entry.key().1 == date)
            .map(|entry| entry.value().clone())
            .collect();
        matches.sort_by(|a, b| a.route_id.cmp(&b.route_id));
        Box::pin(async move { Ok(matches) })
    }

    fn count(&self) -> BoxFuture<'_, Result<usize, StoreError>> {
        let count = self.records.len();
        Box::pin(async move { Ok(count) })
    }
}
