//! `routewatch analytics` - one-shot aggregation run.

use chrono::{Days, NaiveDate, Utc};
use clap::Args;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::error::Error;
use std::sync::Arc;

use routewatch::analytics::{AnalyticsLauncher, AnalyticsPipeline, RunStatus};
use routewatch::app::AppConfig;
use routewatch::store::{AnalyticsStore, MemoryAnalyticsStore, MemoryTelemetryStore};
use routewatch::telemetry::generator::{generate_route_logs, GeneratorSpec};

#[derive(Args)]
pub struct AnalyticsArgs {
    /// Day to aggregate (YYYY-MM-DD, default: yesterday)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Number of route logs to generate
    #[arg(long, default_value_t = 20)]
    routes: usize,

    /// Seed for reproducible telemetry
    #[arg(long)]
    seed: Option<u64>,
}

/// Generates telemetry for one day, runs the pipeline over it and prints
/// the resulting per-route records.
pub async fn execute(config: AppConfig, args: AnalyticsArgs) -> Result<(), Box<dyn Error>> {
    let date = args.date.unwrap_or_else(|| {
        let today = Utc::now().date_naive();
        today.checked_sub_days(Days::new(1)).unwrap_or(today)
    });

    let telemetry = Arc::new(MemoryTelemetryStore::new());
    let analytics_store = Arc::new(MemoryAnalyticsStore::new());

    let spec = GeneratorSpec::for_date(date)
        .with_routes(args.routes)
        .with_depot(config.simulator.depot);
    let mut rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let samples = generate_route_logs(telemetry.as_ref(), &spec, &mut rng).await?;
    println!("Generated {} samples across {} routes for {}", samples, args.routes, date);

    let pipeline = Arc::new(AnalyticsPipeline::new(
        config.analytics.clone(),
        telemetry,
        analytics_store.clone() as Arc<dyn AnalyticsStore>,
    ));
    let launcher = AnalyticsLauncher::new(pipeline);

    let receipt = launcher.start_run(Some(date));
    if !receipt.is_started() {
        return Err(receipt
            .message
            .unwrap_or_else(|| "Run trigger rejected".to_string())
            .into());
    }

    let outcome = launcher
        .wait(receipt.run_id)
        .await
        .ok_or("Run outcome unavailable")?;
    match &outcome.status {
        RunStatus::Completed => println!(
            "Run {} completed: {} records in {} chunks",
            outcome.run_id, outcome.records_written, outcome.chunks_committed
        ),
        RunStatus::Aborted => println!("Run {} aborted at offset {}", outcome.run_id, outcome.cursor),
        RunStatus::Failed(reason) => return Err(format!("Run failed: {}", reason).into()),
    }

    let records = analytics_store.list_for_date(date).await?;
    println!(
        "{:<12} {:>12} {:>10} {:>10} {:>10} {:>10}",
        "route", "distance_km", "avg_kmh", "max_kmh", "minutes", "fuel"
    );
    for record in &records {
        println!(
            "{:<12} {:>12.2} {:>10.1} {:>10.1} {:>10} {:>10}",
            record.route_id,
            record.total_distance_km,
            record.avg_speed_kmh,
            record.max_speed_kmh,
            record
                .duration_minutes
                .map_or_else(|| "-".to_string(), |m| m.to_string()),
            record
                .fuel_efficiency
                .map_or_else(|| "-".to_string(), |f| format!("{:.2}", f)),
        );
    }

    Ok(())
}
