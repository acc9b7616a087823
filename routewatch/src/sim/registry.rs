//! Live route registry.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::route::SimulatedRoute;
use crate::shipment::ShipmentId;

/// Concurrent map of every route currently being simulated.
///
/// Tick iteration is snapshot-then-mutate: callers take [`ids`](Self::ids)
/// first and then visit each entry through
/// [`with_route_mut`](Self::with_route_mut), which scopes the map guard to a
/// synchronous closure. That keeps guards from living across await points
/// or overlapping with [`remove`](Self::remove), which would deadlock the
/// shard locks.
#[derive(Default)]
pub struct RouteRegistry {
    routes: DashMap<ShipmentId, SimulatedRoute>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route if the shipment does not already have one.
    ///
    /// Returns `false` (leaving the existing route untouched) when the
    /// shipment is already registered, so repeated registration cannot
    /// teleport a shipment back to a stale position.
    pub fn register(&self, id: ShipmentId, route: SimulatedRoute) -> bool {
        match self.routes.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(route);
                true
            }
        }
    }

    /// Removes a route. Returns whether it was present.
    pub fn remove(&self, id: &ShipmentId) -> bool {
        self.routes.remove(id).is_some()
    }

    pub fn contains(&self, id: &ShipmentId) -> bool {
        self.routes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Snapshot of every registered shipment id.
    pub fn ids(&self) -> Vec<ShipmentId> {
        self.routes.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Runs a closure against one route under a short-lived mutable guard.
    ///
    /// Returns `None` when the route is no longer registered (it may have
    /// been removed between snapshot and visit).
    pub fn with_route_mut<R>(
        &self,
        id: &ShipmentId,
        f: impl FnOnce(&mut SimulatedRoute) -> R,
    ) -> Option<R> {
        self.routes.get_mut(id).map(|mut entry| f(entry.value_mut()))
    }

    /// Reads one route's state (cloned out from under the guard).
    pub fn route(&self, id: &ShipmentId) -> Option<SimulatedRoute> {
        self.routes.get(id).map(|entry| entry.value().clone())
    }
}
