// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Real-time heartbeat streaming infrastructure.
//!
//! Bridges the engine's event bus onto a broadcast channel that SSE clients
//! subscribe to. Single-tenant: one channel for all connected clients.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

use vigil_core::{EngineEvent, EventKind, Heartbeat};
use vigil_engine::EventBus;

/// Default channel capacity; slow clients miss events past this backlog.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fans persisted heartbeats out to connected SSE clients.
pub struct HeartbeatBroadcaster {
	sender: broadcast::Sender<Heartbeat>,
	events_sent: AtomicU64,
}

impl HeartbeatBroadcaster {
	pub fn new(capacity: usize) -> Self {
		let (sender, _receiver) = broadcast::channel(capacity);
		Self {
			sender,
			events_sent: AtomicU64::new(0),
		}
	}

	pub fn with_default_capacity() -> Self {
		Self::new(DEFAULT_CHANNEL_CAPACITY)
	}

	/// Subscribe a new client.
	pub fn subscribe(&self) -> broadcast::Receiver<Heartbeat> {
		self.sender.subscribe()
	}

	/// Forward one heartbeat to all connected clients. Returns the number of
	/// clients that received it.
	pub fn broadcast(&self, heartbeat: Heartbeat) -> usize {
		if self.sender.receiver_count() == 0 {
			return 0;
		}
		match self.sender.send(heartbeat) {
			Ok(count) => {
				self.events_sent.fetch_add(1, Ordering::Relaxed);
				count
			}
			Err(_) => 0,
		}
	}

	pub fn receiver_count(&self) -> usize {
		self.sender.receiver_count()
	}

	pub fn events_sent(&self) -> u64 {
		self.events_sent.load(Ordering::Relaxed)
	}

	/// Subscribe to heartbeat events on the engine bus.
	pub async fn attach(self: &std::sync::Arc<Self>, bus: &EventBus) {
		let broadcaster = std::sync::Arc::clone(self);
		bus.subscribe(EventKind::Heartbeat, move |event| {
			let broadcaster = std::sync::Arc::clone(&broadcaster);
			async move {
				if let EngineEvent::Heartbeat(heartbeat) = event {
					let delivered = broadcaster.broadcast(heartbeat);
					debug!(delivered, "heartbeat forwarded to stream clients");
				}
			}
		})
		.await;
	}
}

impl Default for HeartbeatBroadcaster {
	fn default() -> Self {
		Self::with_default_capacity()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use std::time::Duration;
	use vigil_core::{HeartbeatId, HeartbeatStatus, MonitorId};

	fn heartbeat() -> Heartbeat {
		Heartbeat {
			id: HeartbeatId::new(),
			monitor_id: MonitorId::new(),
			status: HeartbeatStatus::Up,
			msg: "200 OK".to_string(),
			ping_ms: 45,
			retries: 0,
			down_count: 0,
			important: false,
			notified: false,
			time: Utc::now(),
			end_time: Utc::now(),
		}
	}

	#[tokio::test]
	async fn broadcast_reaches_subscribers() {
		let broadcaster = HeartbeatBroadcaster::with_default_capacity();
		let mut receiver = broadcaster.subscribe();

		assert_eq!(broadcaster.broadcast(heartbeat()), 1);

		let received = tokio::time::timeout(Duration::from_millis(100), receiver.recv())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(received.ping_ms, 45);
		assert_eq!(broadcaster.events_sent(), 1);
	}

	#[tokio::test]
	async fn broadcast_without_clients_is_a_noop() {
		let broadcaster = HeartbeatBroadcaster::with_default_capacity();
		assert_eq!(broadcaster.broadcast(heartbeat()), 0);
		assert_eq!(broadcaster.events_sent(), 0);
	}

	#[tokio::test]
	async fn attach_forwards_bus_events() {
		let broadcaster = std::sync::Arc::new(HeartbeatBroadcaster::with_default_capacity());
		let bus = EventBus::new();
		broadcaster.attach(&bus).await;

		let mut receiver = broadcaster.subscribe();
		bus.publish(EngineEvent::Heartbeat(heartbeat())).await;

		let received = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(received.status, HeartbeatStatus::Up);
	}
}
