//! Simulation tick engine.

use chrono::Utc;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::RouteRegistry;
use super::route::SimulatedRoute;
use super::SimulatorConfig;
use crate::broadcast::{BroadcastSink, PositionEvent};
use crate::coord::{bearing_deg, distance_km, GeoPoint};
use crate::shipment::{Shipment, ShipmentId, ShipmentStatus};
use crate::store::{ShipmentStore, StoreError, TelemetryStore};
use crate::telemetry::{RouteKey, TelemetrySample};

/// Counters for one call to [`SimulationEngine::advance_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Routes that moved this tick
    pub advanced: usize,
    /// Routes that reached their destination and were retired
    pub arrived: usize,
    /// Routes dropped because their shipment vanished or left transit
    pub dropped: usize,
}

/// What happened to a single route during a tick.
enum RouteFate {
    /// Moved, stays registered
    Moved,
    /// Delivered and retired; `moved` is false for the lost-destination path
    Delivered { moved: bool },
    /// Retired without delivery (shipment gone or no longer in transit)
    Abandoned,
    /// Nothing happened (store error or lost race); retried next tick
    Skipped,
}

/// Advances every registered route once per tick.
///
/// The engine owns the in-memory [`RouteRegistry`]; durable truth stays in
/// the [`ShipmentStore`]. Per-route failures are logged and contained so a
/// single bad record or flaky write never stalls the rest of the fleet.
pub struct SimulationEngine {
    config: SimulatorConfig,
    shipments: Arc<dyn ShipmentStore>,
    sink: Arc<dyn BroadcastSink>,
    telemetry: Option<Arc<dyn TelemetryStore>>,
    registry: RouteRegistry,
}

impl SimulationEngine {
    pub fn new(
        config: SimulatorConfig,
        shipments: Arc<dyn ShipmentStore>,
        sink: Arc<dyn BroadcastSink>,
    ) -> Self {
        Self {
            config,
            shipments,
            sink,
            telemetry: None,
            registry: RouteRegistry::new(),
        }
    }

    /// Enables per-move telemetry recording into the given store.
    ///
    /// Samples are only written when the config also has
    /// `record_telemetry` set.
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetryStore>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Number of routes currently registered.
    pub fn live_routes(&self) -> usize {
        self.registry.len()
    }

    /// Registers a route for a shipment, if it qualifies.
    ///
    /// Requires `InTransit` status plus a known current position and
    /// destination; anything else is logged at debug and ignored. Returns
    /// whether a new route was registered.
    pub fn register_shipment(&self, shipment: &Shipment) -> bool {
        if shipment.status != ShipmentStatus::InTransit {
            debug!(
                shipment = %shipment.id,
                status = %shipment.status,
                "Not registering route: shipment is not in transit"
            );
            return false;
        }
        let (current, destination) = match (shipment.current_position, shipment.destination) {
            (Some(current), Some(destination)) => (current, destination),
            _ => {
                debug!(
                    shipment = %shipment.id,
                    "Not registering route: missing position or destination"
                );
                return false;
            }
        };

        self.registry.register(
            shipment.id.clone(),
            SimulatedRoute::new(current, destination, self.config.step_size_deg),
        )
    }

    /// Loads every in-transit shipment and registers routes for them.
    ///
    /// Called at startup; a restarted process resumes from the positions
    /// last persisted rather than from route origins. Returns the number of
    /// live routes.
    pub async fn initialize(&self) -> Result<usize, StoreError> {
        let in_transit = self
            .shipments
            .list_by_status(ShipmentStatus::InTransit)
            .await?;

        let mut registered = 0;
        for shipment in &in_transit {
            if self.register_shipment(shipment) {
                registered += 1;
            }
        }
        info!(routes = self.registry.len(), "Simulation registry initialized");
        Ok(registered)
    }

    /// Runs one simulation tick across every registered route.
    ///
    /// Iteration is snapshot-then-mutate: the id set is captured first,
    /// then each route is visited and, where needed, removed after its
    /// registry guard has been released.
    pub async fn advance_all(&self) -> TickSummary {
        let mut summary = TickSummary::default();

        for id in self.registry.ids() {
            match self.advance_route(&id).await {
                RouteFate::Moved => summary.advanced += 1,
                RouteFate::Delivered { moved } => {
                    if moved {
                        summary.advanced += 1;
                    }
                    summary.arrived += 1;
                    self.registry.remove(&id);
                }
                RouteFate::Abandoned => {
                    summary.dropped += 1;
                    self.registry.remove(&id);
                }
                RouteFate::Skipped => {}
            }
        }
        summary
    }

    /// Advances a single route. Never panics; every failure path downgrades
    /// to a log line and a [`RouteFate`].
    async fn advance_route(&self, id: &ShipmentId) -> RouteFate {
        // Liveness check against durable state before touching the route.
        let shipment = match self.shipments.get(id).await {
            Ok(Some(shipment)) => shipment,
            Ok(None) => {
                warn!(shipment = %id, "Shipment vanished from store; dropping its route");
                return RouteFate::Abandoned;
            }
            Err(error) => {
                warn!(shipment = %id, %error, "Shipment lookup failed; will retry next tick");
                return RouteFate::Skipped;
            }
        };

        if shipment.status != ShipmentStatus::InTransit {
            debug!(
                shipment = %id,
                status = %shipment.status,
                "Shipment left transit externally; dropping its route"
            );
            return RouteFate::Abandoned;
        }

        if shipment.destination.is_none() {
            // Without a destination the route could never arrive, so it is
            // closed out as delivered instead of looping forever.
            warn!(shipment = %id, "Destination cleared mid-flight; closing route as delivered");
            return match self
                .shipments
                .set_status(id, ShipmentStatus::Delivered)
                .await
            {
                Ok(()) => RouteFate::Delivered { moved: false },
                Err(error) => {
                    warn!(shipment = %id, %error, "Delivery status write failed; will retry next tick");
                    RouteFate::Skipped
                }
            };
        }

        // Movement math under a short-lived registry guard; no awaits here.
        let step = self.registry.with_route_mut(id, |route| {
            let previous = route.current();
            let position = route.advance();
            (previous, position, route.has_arrived())
        });
        let (previous, position, arrived) = match step {
            Some(step) => step,
            None => return RouteFate::Skipped,
        };

        match self.shipments.update_position(id, position).await {
            Ok(()) => {
                let event =
                    PositionEvent::for_shipment(&shipment, position, Utc::now().timestamp_millis());
                self.sink.publish(event);
                self.record_sample(&shipment, previous, position).await;
            }
            Err(error) => {
                // In-memory state has already advanced; durable state lags
                // one tick and self-corrects on the next successful write.
                warn!(shipment = %id, %error, "Position write failed; skipping broadcast this tick");
            }
        }

        if arrived {
            match self
                .shipments
                .set_status(id, ShipmentStatus::Delivered)
                .await
            {
                Ok(()) => {
                    info!(
                        shipment = %id,
                        tracking = %shipment.tracking_number,
                        "Shipment reached its destination"
                    );
                    RouteFate::Delivered { moved: true }
                }
                Err(error) => {
                    // Keep the route; next tick re-snaps at zero distance
                    // and retries the delivery write.
                    warn!(shipment = %id, %error, "Delivery status write failed; will retry next tick");
                    RouteFate::Moved
                }
            }
        } else {
            RouteFate::Moved
        }
    }

    /// Writes one derived telemetry sample for a successful move.
    async fn record_sample(&self, shipment: &Shipment, previous: GeoPoint, position: GeoPoint) {
        if !self.config.record_telemetry {
            return;
        }
        let telemetry = match &self.telemetry {
            Some(telemetry) => telemetry,
            None => return,
        };

        let now = Utc::now();
        let tick_secs = self.config.tick_interval.as_secs_f64();
        let speed_kmh = if tick_secs > 0.0 {
            Some(distance_km(previous, position) / tick_secs * 3600.0)
        } else {
            None
        };

        let key = RouteKey::new(
            shipment.id.as_str(),
            shipment.assigned_driver.as_deref().unwrap_or("unassigned"),
            shipment.assigned_vehicle.as_deref().unwrap_or("unassigned"),
            now.date_naive(),
        );
        let sample = TelemetrySample {
            timestamp: now,
            position,
            speed_kmh,
            heading_deg: Some(bearing_deg(previous, position)),
        };

        if let Err(error) = telemetry.append_sample(key, sample).await {
            debug!(shipment = %shipment.id, %error, "Telemetry sample dropped");
        }
    }

    /// Daemon loop: one tick per interval until shutdown.
    ///
    /// Overruns skip intermediate ticks instead of bursting to catch up, so
    /// a slow store stretches the cadence rather than piling work up. The
    /// `biased` select checks shutdown first so cancellation always wins a
    /// race against the timer.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        if !self.config.enabled {
            info!("Simulation engine disabled; tick loop not started");
            return;
        }

        info!(
            interval_ms = self.config.tick_interval.as_millis() as u64,
            step_deg = self.config.step_size_deg,
            "Simulation engine started"
        );

        let mut tick = tokio::time::interval(self.config.tick_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!(live_routes = self.registry.len(), "Simulation engine stopping");
                    break;
                }
                _ = tick.tick() => {
                    let summary = self.advance_all().await;
                    if summary.arrived > 0 || summary.dropped > 0 {
                        debug!(
                            advanced = summary.advanced,
                            arrived = summary.arrived,
                            dropped = summary.dropped,
                            "Simulation tick complete"
                        );
                    }
                }
            }
        }
    }
}
