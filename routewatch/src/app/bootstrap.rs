//! Application bootstrap.
//!
//! `RouteWatchApp` wires the components together in dependency order: stores
//! first, then the fleet seed, then the simulation engine (registry loaded
//! before its daemon starts), then the analytics launcher. Shutdown runs in
//! reverse: the root cancellation token stops the engine loop, and
//! `shutdown()` awaits the task so no tick is left mid-flight.

use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::analytics::{AnalyticsLauncher, AnalyticsPipeline};
use crate::broadcast::{BroadcastSink, PositionChannel, PositionEvent};
use crate::coord::GeoPoint;
use crate::shipment::{ShipmentId, ShipmentStatus};
use crate::sim::{seed, SimulationEngine};
use crate::store::{
    AnalyticsStore, MemoryAnalyticsStore, MemoryShipmentStore, MemoryTelemetryStore,
    ShipmentStore, StoreError, TelemetryStore,
};

/// A running RouteWatch instance.
///
/// Owns the simulation daemon and the analytics launcher; everything else is
/// reachable through accessors. Dropping the app without calling
/// [`shutdown`](Self::shutdown) leaves the engine task running until the
/// runtime itself stops.
pub struct RouteWatchApp {
    config: AppConfig,
    shipments: Arc<dyn ShipmentStore>,
    telemetry: Arc<dyn TelemetryStore>,
    analytics_store: Arc<dyn AnalyticsStore>,
    channel: Arc<PositionChannel>,
    engine: Arc<SimulationEngine>,
    launcher: AnalyticsLauncher,
    shutdown: CancellationToken,
    engine_task: Mutex<Option<JoinHandle<()>>>,
}

impl RouteWatchApp {
    /// Starts the application against fresh in-memory stores.
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        Self::start_with_stores(
            config,
            Arc::new(MemoryShipmentStore::new()),
            Arc::new(MemoryTelemetryStore::new()),
            Arc::new(MemoryAnalyticsStore::new()),
        )
        .await
    }

    /// Starts the application against caller-supplied stores.
    ///
    /// Seeds the fleet up to the configured size (a warm store is topped up,
    /// not re-seeded), loads every in-transit shipment into the simulation
    /// registry, and spawns the engine daemon.
    pub async fn start_with_stores(
        config: AppConfig,
        shipments: Arc<dyn ShipmentStore>,
        telemetry: Arc<dyn TelemetryStore>,
        analytics_store: Arc<dyn AnalyticsStore>,
    ) -> Result<Self, AppError> {
        info!(version = crate::VERSION, "Starting RouteWatch");

        if config.simulator.enabled && config.simulator.route_count > 0 {
            let mut rng = SmallRng::from_entropy();
            seed::seed_fleet(shipments.as_ref(), &config.simulator, &mut rng)
                .await
                .map_err(AppError::Seed)?;
        }

        let channel = Arc::new(PositionChannel::new(config.broadcast_capacity));
        let engine = Arc::new(
            SimulationEngine::new(
                config.simulator.clone(),
                Arc::clone(&shipments),
                Arc::clone(&channel) as Arc<dyn BroadcastSink>,
            )
            .with_telemetry(Arc::clone(&telemetry)),
        );
        engine.initialize().await.map_err(AppError::Initialize)?;

        let shutdown = CancellationToken::new();
        let engine_task = tokio::spawn(Arc::clone(&engine).run(shutdown.child_token()));

        let pipeline = Arc::new(AnalyticsPipeline::new(
            config.analytics.clone(),
            Arc::clone(&telemetry),
            Arc::clone(&analytics_store),
        ));
        let launcher = AnalyticsLauncher::new(pipeline);

        Ok(Self {
            config,
            shipments,
            telemetry,
            analytics_store,
            channel,
            engine,
            launcher,
            shutdown,
            engine_task: Mutex::new(Some(engine_task)),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Subscribes to the global position feed.
    pub fn subscribe_positions(&self) -> broadcast::Receiver<PositionEvent> {
        self.channel.subscribe()
    }

    /// Subscribes to one shipment's position feed.
    pub fn subscribe_shipment(&self, id: &ShipmentId) -> broadcast::Receiver<PositionEvent> {
        self.channel.subscribe_shipment(id)
    }

    /// Last persisted position and status for a shipment.
    pub async fn current_position(
        &self,
        id: &ShipmentId,
    ) -> Result<Option<(GeoPoint, ShipmentStatus)>, StoreError> {
        let shipment = self.shipments.get(id).await?;
        Ok(shipment.and_then(|s| s.current_position.map(|p| (p, s.status))))
    }

    /// Number of routes currently being simulated.
    pub fn live_routes(&self) -> usize {
        self.engine.live_routes()
    }

    /// The analytics trigger surface.
    pub fn analytics(&self) -> &AnalyticsLauncher {
        &self.launcher
    }

    pub fn shipments(&self) -> Arc<dyn ShipmentStore> {
        Arc::clone(&self.shipments)
    }

    pub fn telemetry(&self) -> Arc<dyn TelemetryStore> {
        Arc::clone(&self.telemetry)
    }

    pub fn analytics_store(&self) -> Arc<dyn AnalyticsStore> {
        Arc::clone(&self.analytics_store)
    }

    /// Stops the engine daemon and waits for it to finish its current tick.
    ///
    /// Idempotent; a second call finds no task to await. Analytics runs in
    /// flight are not cancelled — they own their data and finish on their
    /// own tokens.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let task = self.engine_task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
        info!("RouteWatch stopped");
    }
}
