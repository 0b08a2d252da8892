// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process typed publish/subscribe.
//!
//! Couples the engine's producers (post-processor, API-driven lifecycle
//! changes) to its consumers (supervisor listener, stats aggregator,
//! notification dispatcher, real-time stream) without direct references.
//!
//! Delivery is asynchronous and independent: every handler invocation runs on
//! its own task, so a slow or panicking handler cannot block or crash its
//! siblings. There is no delivery-order guarantee across handlers.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

use vigil_core::{EngineEvent, EventKind};

/// A boxed async event handler.
pub type EventHandler = Arc<dyn Fn(EngineEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// The engine's event bus.
pub struct EventBus {
	handlers: RwLock<HashMap<EventKind, Vec<EventHandler>>>,
}

impl EventBus {
	pub fn new() -> Self {
		Self {
			handlers: RwLock::new(HashMap::new()),
		}
	}

	/// Register a handler for an event kind.
	///
	/// The same handler registered twice is invoked once per registration.
	pub async fn subscribe<F, Fut>(&self, kind: EventKind, handler: F)
	where
		F: Fn(EngineEvent) -> Fut + Send + Sync + 'static,
		Fut: std::future::Future<Output = ()> + Send + 'static,
	{
		let handler: EventHandler = Arc::new(move |event| handler(event).boxed());
		self.handlers.write().await.entry(kind).or_default().push(handler);
	}

	/// Deliver an event to every handler registered for its kind.
	///
	/// Returns once all handler tasks are spawned; it never waits for them.
	pub async fn publish(&self, event: EngineEvent) {
		let handlers = {
			let registered = self.handlers.read().await;
			registered.get(&event.kind()).cloned().unwrap_or_default()
		};

		if handlers.is_empty() {
			debug!(event_type = event.event_type(), "no handlers for event");
			return;
		}

		for handler in handlers {
			let event = event.clone();
			let event_type = event.event_type();
			let future = handler(event);
			tokio::spawn(async move {
				if AssertUnwindSafe(future).catch_unwind().await.is_err() {
					error!(event_type, "event handler panicked");
				}
			});
		}
	}

	/// Number of registrations for a kind.
	pub async fn handler_count(&self, kind: EventKind) -> usize {
		self.handlers
			.read()
			.await
			.get(&kind)
			.map(Vec::len)
			.unwrap_or(0)
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;
	use vigil_core::MonitorId;

	async fn wait_for(counter: &Arc<AtomicUsize>, expected: usize) {
		tokio::time::timeout(Duration::from_secs(2), async {
			while counter.load(Ordering::SeqCst) < expected {
				tokio::time::sleep(Duration::from_millis(5)).await;
			}
		})
		.await
		.expect("handlers did not run in time");
	}

	#[tokio::test]
	async fn delivers_to_all_handlers_of_the_kind() {
		let bus = EventBus::new();
		let counter = Arc::new(AtomicUsize::new(0));

		for _ in 0..3 {
			let counter = counter.clone();
			bus.subscribe(EventKind::MonitorDeleted, move |_| {
				let counter = counter.clone();
				async move {
					counter.fetch_add(1, Ordering::SeqCst);
				}
			})
			.await;
		}

		bus.publish(EngineEvent::MonitorDeleted(MonitorId::new())).await;
		wait_for(&counter, 3).await;
	}

	#[tokio::test]
	async fn duplicate_registration_fires_once_per_registration() {
		let bus = EventBus::new();
		let counter = Arc::new(AtomicUsize::new(0));

		let handler = {
			let counter = counter.clone();
			move |_: EngineEvent| {
				let counter = counter.clone();
				async move {
					counter.fetch_add(1, Ordering::SeqCst);
				}
			}
		};
		bus.subscribe(EventKind::ProxyDeleted, handler.clone()).await;
		bus.subscribe(EventKind::ProxyDeleted, handler).await;

		bus.publish(EngineEvent::ProxyDeleted(vigil_core::ProxyId::new())).await;
		wait_for(&counter, 2).await;
	}

	#[tokio::test]
	async fn other_kinds_are_not_delivered() {
		let bus = EventBus::new();
		let counter = Arc::new(AtomicUsize::new(0));

		{
			let counter = counter.clone();
			bus.subscribe(EventKind::MonitorDeleted, move |_| {
				let counter = counter.clone();
				async move {
					counter.fetch_add(1, Ordering::SeqCst);
				}
			})
			.await;
		}

		bus.publish(EngineEvent::ProxyDeleted(vigil_core::ProxyId::new())).await;
		tokio::time::sleep(Duration::from_millis(50)).await;
		assert_eq!(counter.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn panicking_handler_does_not_starve_siblings() {
		let bus = EventBus::new();
		let counter = Arc::new(AtomicUsize::new(0));

		bus.subscribe(EventKind::MonitorDeleted, |_| async {
			panic!("handler exploded");
		})
		.await;
		{
			let counter = counter.clone();
			bus.subscribe(EventKind::MonitorDeleted, move |_| {
				let counter = counter.clone();
				async move {
					counter.fetch_add(1, Ordering::SeqCst);
				}
			})
			.await;
		}

		// Two publishes: the panicking handler dies both times, the healthy
		// sibling receives both.
		bus.publish(EngineEvent::MonitorDeleted(MonitorId::new())).await;
		bus.publish(EngineEvent::MonitorDeleted(MonitorId::new())).await;
		wait_for(&counter, 2).await;
	}

	#[tokio::test]
	async fn handler_count_tracks_registrations() {
		let bus = EventBus::new();
		assert_eq!(bus.handler_count(EventKind::Heartbeat).await, 0);

		bus.subscribe(EventKind::Heartbeat, |_| async {}).await;
		bus.subscribe(EventKind::Heartbeat, |_| async {}).await;
		assert_eq!(bus.handler_count(EventKind::Heartbeat).await, 2);
	}
}
