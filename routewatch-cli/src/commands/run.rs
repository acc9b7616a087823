//! `routewatch run` - live simulation feed.

use clap::Args;
use std::error::Error;
use tracing::{info, warn};

use routewatch::app::{AppConfig, RouteWatchApp};
use routewatch::shipment::ShipmentStatus;
use tokio::sync::broadcast::error::RecvError;

#[derive(Args)]
pub struct RunArgs {
    /// Stop after this many ticks instead of waiting for Ctrl-C
    #[arg(long)]
    ticks: Option<u32>,
}

/// Seeds a fleet, starts the simulation and prints one JSON line per
/// position event until Ctrl-C (or the tick budget) stops it.
pub async fn execute(config: AppConfig, args: RunArgs) -> Result<(), Box<dyn Error>> {
    let tick_interval = config.simulator.tick_interval;
    let app = RouteWatchApp::start(config).await?;
    let mut feed = app.subscribe_positions();

    info!(
        fleet = app.config().simulator.route_count,
        "Simulation running; streaming position events"
    );

    // Without --ticks the deadline never fires
    let deadline = async {
        match args.ticks {
            Some(ticks) => tokio::time::sleep(tick_interval.saturating_mul(ticks)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted; shutting down");
                break;
            }
            _ = &mut deadline => {
                info!("Tick budget exhausted; shutting down");
                break;
            }
            event = feed.recv() => match event {
                Ok(event) => println!("{}", serde_json::to_string(&event)?),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Feed consumer lagged; events dropped")
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    app.shutdown().await;

    let delivered = app
        .shipments()
        .count_by_status(ShipmentStatus::Delivered)
        .await?;
    let in_transit = app
        .shipments()
        .count_by_status(ShipmentStatus::InTransit)
        .await?;
    println!("Delivered: {}  Still in transit: {}", delivered, in_transit);

    Ok(())
}
