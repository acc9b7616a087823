//! Position event fan-out
//!
//! The simulation engine publishes one event per moved route per tick.
//! Publishing is fire-and-forget: the engine never blocks on subscribers and
//! never learns whether anyone is listening. Two logical topics exist, a
//! global feed carrying every shipment and a per-shipment feed for clients
//! watching a single tracking page.
//!
//! [`PositionChannel`] is the in-process implementation over
//! `tokio::sync::broadcast`; anything else (a message broker bridge, a test
//! recorder) plugs in behind the [`BroadcastSink`] trait.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::coord::GeoPoint;
use crate::shipment::{Shipment, ShipmentId, ShipmentStatus};

/// Default ring capacity per broadcast channel.
///
/// Slow consumers that fall more than this many events behind observe
/// `RecvError::Lagged` and resume from the oldest retained event.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// A live position update for one shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionEvent {
    pub shipment_id: ShipmentId,
    pub tracking_number: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: ShipmentStatus,
    /// Milliseconds since the Unix epoch, assigned at publish time
    #[serde(rename = "timestamp")]
    pub timestamp_millis: i64,
}

impl PositionEvent {
    /// Builds an event for a shipment at a freshly computed position.
    pub fn for_shipment(shipment: &Shipment, position: GeoPoint, timestamp_millis: i64) -> Self {
        Self {
            shipment_id: shipment.id.clone(),
            tracking_number: shipment.tracking_number.clone(),
            latitude: position.lat,
            longitude: position.lon,
            status: shipment.status,
            timestamp_millis,
        }
    }
}

/// Where the engine hands off position events.
///
/// Implementations must be non-blocking and must not panic; the engine calls
/// this from inside its tick loop with no error handling of its own.
pub trait BroadcastSink: Send + Sync {
    fn publish(&self, event: PositionEvent);
}

/// Sink that discards every event. Useful for headless runs and tests.
#[derive(Debug, Default)]
pub struct NullSink;

impl BroadcastSink for NullSink {
    fn publish(&self, _event: PositionEvent) {}
}

/// In-process broadcast channels: one global feed plus lazily created
/// per-shipment feeds.
pub struct PositionChannel {
    global: broadcast::Sender<PositionEvent>,
    per_shipment: DashMap<ShipmentId, broadcast::Sender<PositionEvent>>,
    capacity: usize,
}

impl PositionChannel {
    pub fn new(capacity: usize) -> Self {
        let (global, _) = broadcast::channel(capacity);
        Self {
            global,
            per_shipment: DashMap::new(),
            capacity,
        }
    }

    /// Subscribes to every shipment's events.
    pub fn subscribe(&self) -> broadcast::Receiver<PositionEvent> {
        self.global.subscribe()
    }

    /// Subscribes to one shipment's events.
    ///
    /// The per-shipment channel is created on first subscription and torn
    /// down once all of its receivers are gone (observed at publish time).
    pub fn subscribe_shipment(&self, id: &ShipmentId) -> broadcast::Receiver<PositionEvent> {
        self.per_shipment
            .entry(id.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of per-shipment channels currently alive.
    pub fn shipment_channel_count(&self) -> usize {
        self.per_shipment.len()
    }
}

impl Default for PositionChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl BroadcastSink for PositionChannel {
    fn publish(&self, event: PositionEvent) {
        // A send error only means no receivers right now; that is fine for
        // the global feed but marks a per-shipment channel as stale.
        let _ = self.global.send(event.clone());

        let id = event.shipment_id.clone();
        let stale = match self.per_shipment.get(&id) {
            Some(tx) => tx.send(event).is_err(),
            None => return,
        };
        if stale {
            // Guard dropped above; safe to remove. A racing subscriber
            // simply recreates the channel on its next subscribe call.
            self.per_shipment.remove_if(&id, |_, tx| tx.receiver_count() == 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    fn event_for(id: &str, lat: f64) -> PositionEvent {
        PositionEvent {
            shipment_id: ShipmentId::new(id),
            tracking_number: format!("RW-2026-{:06}", 1),
            latitude: lat,
            longitude: 77.2,
            status: ShipmentStatus::InTransit,
            timestamp_millis: 1_755_600_000_000,
        }
    }

    #[tokio::test]
    async fn test_global_subscriber_sees_all_shipments() {
        let channel = PositionChannel::default();
        let mut rx = channel.subscribe();

        channel.publish(event_for("s-1", 28.61));
        channel.publish(event_for("s-2", 28.62));

        assert_eq!(rx.recv().await.unwrap().shipment_id, ShipmentId::new("s-1"));
        assert_eq!(rx.recv().await.unwrap().shipment_id, ShipmentId::new("s-2"));
    }

    #[tokio::test]
    async fn test_shipment_subscriber_sees_only_its_shipment() {
        let channel = PositionChannel::default();
        let mut rx = channel.subscribe_shipment(&ShipmentId::new("s-1"));

        channel.publish(event_for("s-2", 28.62));
        channel.publish(event_for("s-1", 28.61));

        let got = rx.recv().await.unwrap();
        assert_eq!(got.shipment_id, ShipmentId::new("s-1"));
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[test]
    fn test_publish_without_subscribers_is_a_no_op() {
        let channel = PositionChannel::default();
        // Must not panic or block
        channel.publish(event_for("s-1", 28.61));
    }

    #[tokio::test]
    async fn test_stale_shipment_channel_is_torn_down() {
        let channel = PositionChannel::default();
        let id = ShipmentId::new("s-1");

        let rx = channel.subscribe_shipment(&id);
        assert_eq!(channel.shipment_channel_count(), 1);
        drop(rx);

        channel.publish(event_for("s-1", 28.61));
        assert_eq!(channel.shipment_channel_count(), 0);
    }

    #[tokio::test]
    async fn test_global_feed_survives_stale_channel_teardown() {
        let channel = PositionChannel::default();
        let id = ShipmentId::new("s-1");
        let mut global = channel.subscribe();

        let rx = channel.subscribe_shipment(&id);
        drop(rx);
        channel.publish(event_for("s-1", 28.61));

        // The per-shipment channel is gone but the global copy of the
        // same event still arrives intact.
        assert_eq!(channel.shipment_channel_count(), 0);
        let got = global.recv().await.unwrap();
        assert_eq!(got.shipment_id, id);
        assert_eq!(got.latitude, 28.61);
    }

    #[tokio::test]
    async fn test_slow_consumer_observes_lag() {
        let channel = PositionChannel::new(2);
        let mut rx = channel.subscribe();

        for i in 0..4 {
            channel.publish(event_for("s-1", 28.0 + i as f64));
        }

        match rx.recv().await {
            Err(RecvError::Lagged(missed)) => assert_eq!(missed, 2),
            other => panic!("Expected lag, got {:?}", other),
        }
        // After the lag report the consumer resumes with retained events
        assert_eq!(rx.recv().await.unwrap().latitude, 30.0);
    }

    #[test]
    fn test_event_wire_format() {
        let event = event_for("s-1", 28.61);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["shipmentId"], "s-1");
        assert_eq!(json["trackingNumber"], "RW-2026-000001");
        assert_eq!(json["latitude"], 28.61);
        assert_eq!(json["longitude"], 77.2);
        assert_eq!(json["status"], "IN_TRANSIT");
        assert_eq!(json["timestamp"], 1_755_600_000_000_i64);
    }
}
