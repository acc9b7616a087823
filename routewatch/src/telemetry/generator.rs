//! Telemetry test-data generator
//!
//! Produces a realistic day of route logs for demos and pipeline tests:
//! random-walk position traces around a depot with plausible speeds and
//! headings. Deterministic under a seeded rng.

use chrono::{Days, Duration, NaiveDate, NaiveTime, Utc};
use rand::Rng;
use tracing::info;

use super::{RouteKey, RouteLog, TelemetrySample};
use crate::coord::{GeoPoint, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use crate::sim::seed::{DRIVER_POOL, VEHICLE_POOL};
use crate::sim::{DEFAULT_DEPOT, DEFAULT_SPAWN_RADIUS_DEG};
use crate::store::{StoreError, TelemetryStore};

/// Route logs appended per bulk write.
pub const APPEND_BATCH: usize = 1000;

/// Minimum samples per generated route.
pub const MIN_SAMPLES: usize = 50;

/// Additional random samples per route, exclusive upper bound.
pub const EXTRA_SAMPLES: usize = 50;

/// Spacing between consecutive samples.
const SAMPLE_SPACING_MINUTES: i64 = 2;

/// Largest per-sample random-walk step, in degrees.
const WALK_STEP_DEG: f64 = 0.002;

/// Shape of the day to generate.
#[derive(Debug, Clone)]
pub struct GeneratorSpec {
    /// Number of route logs to create
    pub routes: usize,
    /// Calendar day the samples belong to
    pub date: NaiveDate,
    /// Center of the region routes wander around
    pub depot: GeoPoint,
    /// Half-width of the square start positions scatter over, in degrees
    pub scatter_deg: f64,
}

impl GeneratorSpec {
    /// Twenty routes around the default depot on the given day.
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            routes: 20,
            date,
            depot: DEFAULT_DEPOT,
            scatter_deg: DEFAULT_SPAWN_RADIUS_DEG,
        }
    }

    /// Yesterday's date (UTC), matching the pipeline's default target.
    pub fn for_yesterday() -> Self {
        let today = Utc::now().date_naive();
        Self::for_date(today.checked_sub_days(Days::new(1)).unwrap_or(today))
    }

    pub fn with_routes(mut self, routes: usize) -> Self {
        self.routes = routes;
        self
    }

    pub fn with_depot(mut self, depot: GeoPoint) -> Self {
        self.depot = depot;
        self
    }
}

/// Generates and appends one day of route logs.
///
/// Each route gets `50 + rand(50)` samples at two-minute spacing starting at
/// 08:00 UTC, positions random-walking from a scattered start point, speeds
/// uniform in [30, 70) km/h. Logs are appended in batches of [`APPEND_BATCH`]
/// so very large fleets never build one giant write. Returns the total
/// number of samples written.
pub async fn generate_route_logs(
    store: &dyn TelemetryStore,
    spec: &GeneratorSpec,
    rng: &mut impl Rng,
) -> Result<usize, StoreError> {
    let day_start = spec.date.and_time(NaiveTime::MIN).and_utc() + Duration::hours(8);

    let mut logs = Vec::with_capacity(spec.routes.min(APPEND_BATCH));
    let mut total_samples = 0;

    for route in 1..=spec.routes {
        let key = RouteKey::new(
            format!("route-{:03}", route),
            format!("driver-{}", (route - 1) % DRIVER_POOL + 1),
            format!("vehicle-{}", (route - 1) % VEHICLE_POOL + 1),
            spec.date,
        );

        let sample_count = MIN_SAMPLES + rng.gen_range(0..EXTRA_SAMPLES);
        let mut position = GeoPoint {
            lat: (spec.depot.lat + rng.gen_range(-spec.scatter_deg..=spec.scatter_deg))
                .clamp(MIN_LAT, MAX_LAT),
            lon: (spec.depot.lon + rng.gen_range(-spec.scatter_deg..=spec.scatter_deg))
                .clamp(MIN_LON, MAX_LON),
        };

        let mut samples = Vec::with_capacity(sample_count);
        for i in 0..sample_count {
            samples.push(TelemetrySample {
                timestamp: day_start + Duration::minutes(i as i64 * SAMPLE_SPACING_MINUTES),
                position,
                speed_kmh: Some(rng.gen_range(30.0..70.0)),
                heading_deg: Some(rng.gen_range(0.0..360.0)),
            });
            position = GeoPoint {
                lat: (position.lat + rng.gen_range(-WALK_STEP_DEG..=WALK_STEP_DEG))
                    .clamp(MIN_LAT, MAX_LAT),
                lon: (position.lon + rng.gen_range(-WALK_STEP_DEG..=WALK_STEP_DEG))
                    .clamp(MIN_LON, MAX_LON),
            };
        }

        total_samples += samples.len();
        logs.push(RouteLog::with_samples(key, samples));

        if logs.len() == APPEND_BATCH {
            store.append_logs(std::mem::take(&mut logs)).await?;
        }
    }
    if !logs.is_empty() {
        store.append_logs(logs).await?;
    }

    info!(
        routes = spec.routes,
        samples = total_samples,
        date = %spec.date,
        "Telemetry generated"
    );
    Ok(total_samples)
}

/// Empties the telemetry store. Idempotent.
pub async fn clear_telemetry(store: &dyn TelemetryStore) -> Result<(), StoreError> {
    store.clear().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BoxFuture, MemoryTelemetryStore};
    use chrono::Timelike;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 20).unwrap()
    }

    #[tokio::test]
    async fn test_generates_requested_routes() {
        let store = MemoryTelemetryStore::new();
        let spec = GeneratorSpec::for_date(date()).with_routes(5);
        let mut rng = SmallRng::seed_from_u64(7);

        let samples = generate_route_logs(&store, &spec, &mut rng).await.unwrap();

        assert_eq!(store.count_for_date(date()).await.unwrap(), 5);
        assert!(samples >= 5 * MIN_SAMPLES);
        assert!(samples < 5 * (MIN_SAMPLES + EXTRA_SAMPLES));
    }

    #[tokio::test]
    async fn test_samples_are_plausible() {
        let store = MemoryTelemetryStore::new();
        let spec = GeneratorSpec::for_date(date()).with_routes(3);
        let mut rng = SmallRng::seed_from_u64(42);

        generate_route_logs(&store, &spec, &mut rng).await.unwrap();
        let logs = store.read_page(date(), 0, 10).await.unwrap();

        for log in &logs {
            assert!(log.samples.len() >= MIN_SAMPLES);
            assert!(log.samples.len() < MIN_SAMPLES + EXTRA_SAMPLES);

            let first = &log.samples[0];
            assert_eq!(first.timestamp.hour(), 8);
            assert_eq!(first.timestamp.minute(), 0);

            for pair in log.samples.windows(2) {
                let gap = pair[1].timestamp - pair[0].timestamp;
                assert_eq!(gap.num_minutes(), SAMPLE_SPACING_MINUTES);

                let dlat = (pair[1].position.lat - pair[0].position.lat).abs();
                assert!(dlat <= WALK_STEP_DEG + 1e-12, "Walk step bounded");
            }
            for sample in &log.samples {
                let speed = sample.speed_kmh.unwrap();
                assert!((30.0..70.0).contains(&speed));
                let heading = sample.heading_deg.unwrap();
                assert!((0.0..360.0).contains(&heading));
            }
        }
    }

    #[tokio::test]
    async fn test_seeded_generation_is_deterministic() {
        let a = MemoryTelemetryStore::new();
        let b = MemoryTelemetryStore::new();
        let spec = GeneratorSpec::for_date(date()).with_routes(4);

        generate_route_logs(&a, &spec, &mut SmallRng::seed_from_u64(9))
            .await
            .unwrap();
        generate_route_logs(&b, &spec, &mut SmallRng::seed_from_u64(9))
            .await
            .unwrap();

        let logs_a = a.read_page(date(), 0, 10).await.unwrap();
        let logs_b = b.read_page(date(), 0, 10).await.unwrap();
        assert_eq!(logs_a, logs_b);
    }

    #[tokio::test]
    async fn test_driver_and_vehicle_pools_rotate() {
        let store = MemoryTelemetryStore::new();
        let spec = GeneratorSpec::for_date(date()).with_routes(DRIVER_POOL + 1);
        let mut rng = SmallRng::seed_from_u64(1);

        generate_route_logs(&store, &spec, &mut rng).await.unwrap();
        let logs = store.read_page(date(), 0, DRIVER_POOL + 1).await.unwrap();

        assert_eq!(logs[0].key.driver_id, "driver-1");
        let wrapped = logs
            .iter()
            .find(|log| log.key.route_id == format!("route-{:03}", DRIVER_POOL + 1))
            .unwrap();
        assert_eq!(wrapped.key.driver_id, "driver-1");
        assert_eq!(wrapped.key.vehicle_id, format!("vehicle-{}", DRIVER_POOL + 1));
    }

    /// Store wrapper counting bulk appends.
    struct CountingStore {
        inner: MemoryTelemetryStore,
        appends: AtomicUsize,
    }

    impl TelemetryStore for CountingStore {
        fn append_sample(
            &self,
            key: RouteKey,
            sample: TelemetrySample,
        ) -> BoxFuture<'_, Result<(), StoreError>> {
            self.inner.append_sample(key, sample)
        }

        fn append_logs(&self, logs: Vec<RouteLog>) -> BoxFuture<'_, Result<(), StoreError>> {
            self.appends.fetch_add(1, Ordering::SeqCst);
            self.inner.append_logs(logs)
        }

        fn read_page(
            &self,
            date: NaiveDate,
            offset: usize,
            limit: usize,
        ) -> BoxFuture<'_, Result<Vec<RouteLog>, StoreError>> {
            self.inner.read_page(date, offset, limit)
        }

        fn count_for_date(&self, date: NaiveDate) -> BoxFuture<'_, Result<usize, StoreError>> {
            self.inner.count_for_date(date)
        }

        fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>> {
            self.inner.clear()
        }
    }

    #[tokio::test]
    async fn test_large_fleets_append_in_batches() {
        let store = Arc::new(CountingStore {
            inner: MemoryTelemetryStore::new(),
            appends: AtomicUsize::new(0),
        });
        let spec = GeneratorSpec::for_date(date()).with_routes(APPEND_BATCH + 1);
        let mut rng = SmallRng::seed_from_u64(3);

        generate_route_logs(store.as_ref(), &spec, &mut rng)
            .await
            .unwrap();

        assert_eq!(store.appends.load(Ordering::SeqCst), 2);
        assert_eq!(
            store.count_for_date(date()).await.unwrap(),
            APPEND_BATCH + 1
        );
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = MemoryTelemetryStore::new();
        let spec = GeneratorSpec::for_date(date()).with_routes(2);
        generate_route_logs(&store, &spec, &mut SmallRng::seed_from_u64(5))
            .await
            .unwrap();

        clear_telemetry(&store).await.unwrap();
        assert_eq!(store.count_for_date(date()).await.unwrap(), 0);
        clear_telemetry(&store).await.unwrap();
    }
}
