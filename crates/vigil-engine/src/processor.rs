// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Heartbeat post-processing.
//!
//! Converts a probe outcome into a persisted heartbeat: applies the retry
//! budget (Down is held as Pending while retries remain), classifies the
//! status transition for the timeline (`important`) and for paging
//! (`notified`), applies the reminder cadence for monitors stuck Down, writes
//! the heartbeat and emits the bus events.
//!
//! Processing for one monitor is serialized with a per-monitor mutex around
//! the read-previous/write-current section, so detached probe tasks cannot
//! interleave destructively.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, instrument, warn};

use vigil_core::{
	EngineEvent, Heartbeat, HeartbeatId, HeartbeatStatus, Monitor, MonitorId, ProbeOutcome,
};
use vigil_server_db::HeartbeatStore;

use crate::bus::EventBus;
use crate::error::Result;

/// The outcome of post-processing one probe result.
#[derive(Debug, Clone)]
pub struct Processed {
	pub heartbeat: Heartbeat,
	/// The cadence the tick loop should adopt next.
	pub next_interval: Duration,
}

/// Transitions surfaced prominently in the timeline.
fn is_important_transition(prev: HeartbeatStatus, next: HeartbeatStatus) -> bool {
	use HeartbeatStatus::{Down, Maintenance, Pending, Up};
	matches!(
		(prev, next),
		(Down, Up)
			| (Up, Down)
			| (Pending, Down)
			| (Maintenance, Down)
			| (Maintenance, Up)
			| (Down, Maintenance)
			| (Up, Maintenance)
	)
}

/// The stricter subset of transitions that page humans. Moves into and out of
/// maintenance mark the timeline but do not page, except a recovery or a
/// failure straight out of a window.
fn is_notify_transition(prev: HeartbeatStatus, next: HeartbeatStatus) -> bool {
	use HeartbeatStatus::{Down, Maintenance, Pending, Up};
	matches!(
		(prev, next),
		(Maintenance, Down) | (Up, Down) | (Down, Up) | (Pending, Down)
	)
}

/// The heartbeat state machine.
pub struct HeartbeatProcessor {
	heartbeats: Arc<dyn HeartbeatStore>,
	bus: Arc<EventBus>,
	locks: Mutex<HashMap<MonitorId, Arc<Mutex<()>>>>,
}

impl HeartbeatProcessor {
	pub fn new(heartbeats: Arc<dyn HeartbeatStore>, bus: Arc<EventBus>) -> Self {
		Self {
			heartbeats,
			bus,
			locks: Mutex::new(HashMap::new()),
		}
	}

	async fn monitor_lock(&self, monitor_id: MonitorId) -> Arc<Mutex<()>> {
		let mut locks = self.locks.lock().await;
		locks.entry(monitor_id).or_default().clone()
	}

	/// Drop the serialization lock for a deleted monitor.
	pub async fn forget(&self, monitor_id: MonitorId) {
		self.locks.lock().await.remove(&monitor_id);
	}

	/// Run the state machine for one probe outcome.
	///
	/// Persists the resulting heartbeat and publishes the heartbeat event
	/// (always) plus the status-change event (iff `notified`). On persistence
	/// failure nothing is published.
	#[instrument(skip(self, monitor, outcome), fields(monitor_id = %monitor.id, status = %outcome.status))]
	pub async fn process(&self, monitor: &Monitor, outcome: &ProbeOutcome) -> Result<Processed> {
		let lock = self.monitor_lock(monitor.id).await;
		let _guard = lock.lock().await;

		let previous = match self.heartbeats.latest_by_monitor(monitor.id).await {
			Ok(previous) => previous,
			Err(e) => {
				warn!(monitor_id = %monitor.id, error = %e, "failed to load previous heartbeat, treating as first beat");
				None
			}
		};
		let is_first = previous.is_none();

		let mut status = outcome.status;
		let mut retries = previous.as_ref().map(|p| p.retries).unwrap_or(0);
		let mut down_count = previous.as_ref().map(|p| p.down_count).unwrap_or(0);

		let next_interval = if outcome.status == HeartbeatStatus::Down {
			// Hold the monitor in Pending while the retry budget lasts.
			if !is_first && monitor.max_retries > 0 && retries < monitor.max_retries {
				status = HeartbeatStatus::Pending;
			}
			retries += 1;
			monitor.retry_interval()
		} else {
			retries = 0;
			monitor.interval()
		};

		let important = match previous.as_ref() {
			None => true,
			Some(previous) => is_important_transition(previous.status, status),
		};
		let mut notified = match previous.as_ref() {
			None => true,
			Some(previous) => is_notify_transition(previous.status, status),
		};

		if important {
			down_count = 0;
		} else if outcome.status == HeartbeatStatus::Down && monitor.resend_interval > 0 {
			down_count += 1;
			if down_count >= monitor.resend_interval {
				notified = true;
				down_count = 0;
			}
		}

		let heartbeat = Heartbeat {
			id: HeartbeatId::new(),
			monitor_id: monitor.id,
			status,
			msg: outcome.message.clone(),
			ping_ms: outcome.ping_ms(),
			retries,
			down_count,
			important,
			notified,
			time: outcome.started_at,
			end_time: outcome.finished_at,
		};

		if let Err(e) = self.heartbeats.create(&heartbeat).await {
			// The event emissions are tied to the persisted record; without
			// it, consumers would aggregate a beat that does not exist.
			error!(monitor_id = %monitor.id, error = %e, "failed to persist heartbeat, dropping events");
			return Err(e.into());
		}

		self.bus
			.publish(EngineEvent::Heartbeat(heartbeat.clone()))
			.await;
		if notified {
			self.bus
				.publish(EngineEvent::StatusChanged(heartbeat.clone()))
				.await;
		}

		Ok(Processed {
			heartbeat,
			next_interval,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use vigil_server_db::{
		testing::create_test_pool, MonitorRepository, SqliteHeartbeatStore, SqliteMonitorRepository,
	};

	fn monitor(max_retries: u32, resend_interval: u32) -> Monitor {
		Monitor {
			id: MonitorId::new(),
			name: "fsm test".to_string(),
			kind: "http".to_string(),
			active: true,
			interval_secs: 60,
			timeout_secs: 16,
			max_retries,
			retry_interval_secs: 30,
			resend_interval,
			proxy_id: None,
			push_token: None,
			config: serde_json::json!({}),
			created_at: Utc::now(),
			updated_at: Utc::now(),
		}
	}

	async fn setup(monitor: &Monitor) -> HeartbeatProcessor {
		let pool = create_test_pool().await;
		SqliteMonitorRepository::new(pool.clone())
			.create(monitor)
			.await
			.unwrap();
		let store = Arc::new(SqliteHeartbeatStore::new(pool));
		HeartbeatProcessor::new(store, Arc::new(EventBus::new()))
	}

	fn up(ping_ms: i64) -> ProbeOutcome {
		let finished = Utc::now();
		ProbeOutcome {
			status: HeartbeatStatus::Up,
			message: "200 OK".to_string(),
			started_at: finished - chrono::Duration::milliseconds(ping_ms),
			finished_at: finished,
		}
	}

	fn down() -> ProbeOutcome {
		let now = Utc::now();
		ProbeOutcome {
			status: HeartbeatStatus::Down,
			message: "connection refused".to_string(),
			started_at: now,
			finished_at: now,
		}
	}

	#[tokio::test]
	async fn first_beat_pages_regardless_of_outcome() {
		// Scenario: new monitor, first probe Up with 45ms ping.
		let monitor = monitor(2, 0);
		let processor = setup(&monitor).await;

		let processed = processor.process(&monitor, &up(45)).await.unwrap();
		let beat = &processed.heartbeat;

		assert_eq!(beat.status, HeartbeatStatus::Up);
		assert_eq!(beat.ping_ms, 45);
		assert_eq!(beat.retries, 0);
		assert_eq!(beat.down_count, 0);
		assert!(beat.important);
		assert!(beat.notified);
		assert_eq!(processed.next_interval, Duration::from_secs(60));
	}

	#[tokio::test]
	async fn first_beat_down_is_down_not_pending() {
		// Retries start at 0 on the first beat, so the promotion cannot fire.
		let monitor = monitor(3, 0);
		let processor = setup(&monitor).await;

		let processed = processor.process(&monitor, &down()).await.unwrap();

		assert_eq!(processed.heartbeat.status, HeartbeatStatus::Down);
		assert!(processed.heartbeat.important);
		assert!(processed.heartbeat.notified);
	}

	#[tokio::test]
	async fn retry_budget_holds_down_as_pending() {
		// Scenario: last beat Up, max_retries=2, three consecutive Down
		// probes produce Pending(1), Pending(2), Down(3).
		let monitor = monitor(2, 0);
		let processor = setup(&monitor).await;

		processor.process(&monitor, &up(10)).await.unwrap();

		let first = processor.process(&monitor, &down()).await.unwrap();
		assert_eq!(first.heartbeat.status, HeartbeatStatus::Pending);
		assert_eq!(first.heartbeat.retries, 1);
		assert!(!first.heartbeat.important);
		assert!(!first.heartbeat.notified);
		assert_eq!(first.next_interval, Duration::from_secs(30));

		let second = processor.process(&monitor, &down()).await.unwrap();
		assert_eq!(second.heartbeat.status, HeartbeatStatus::Pending);
		assert_eq!(second.heartbeat.retries, 2);
		assert!(!second.heartbeat.important);

		let third = processor.process(&monitor, &down()).await.unwrap();
		assert_eq!(third.heartbeat.status, HeartbeatStatus::Down);
		assert_eq!(third.heartbeat.retries, 3);
		assert!(third.heartbeat.important);
		assert!(third.heartbeat.notified);
		assert_eq!(third.next_interval, Duration::from_secs(30));
	}

	#[tokio::test]
	async fn steady_up_is_quiet() {
		// Up, Up, Up, ... pages exactly once.
		let monitor = monitor(0, 0);
		let processor = setup(&monitor).await;

		let first = processor.process(&monitor, &up(10)).await.unwrap();
		assert!(first.heartbeat.important);

		for _ in 0..3 {
			let processed = processor.process(&monitor, &up(10)).await.unwrap();
			assert!(!processed.heartbeat.important);
			assert!(!processed.heartbeat.notified);
			assert_eq!(processed.heartbeat.retries, 0);
		}
	}

	#[tokio::test]
	async fn resend_cadence_fires_every_nth_down() {
		// Scenario: Up → Down transition already notified; resend_interval=5,
		// max_retries=0. Beats 1..4 stay quiet, beat 5 re-pages, and the
		// cycle repeats at beat 10.
		let monitor = monitor(0, 5);
		let processor = setup(&monitor).await;

		processor.process(&monitor, &up(10)).await.unwrap();
		let transition = processor.process(&monitor, &down()).await.unwrap();
		assert!(transition.heartbeat.important);
		assert!(transition.heartbeat.notified);
		assert_eq!(transition.heartbeat.down_count, 0);

		for expected in 1..=4u32 {
			let processed = processor.process(&monitor, &down()).await.unwrap();
			assert!(!processed.heartbeat.important);
			assert!(!processed.heartbeat.notified, "beat {expected} paged early");
			assert_eq!(processed.heartbeat.down_count, expected);
		}

		let fifth = processor.process(&monitor, &down()).await.unwrap();
		assert!(!fifth.heartbeat.important);
		assert!(fifth.heartbeat.notified);
		assert_eq!(fifth.heartbeat.down_count, 0);

		for _ in 1..=4u32 {
			let processed = processor.process(&monitor, &down()).await.unwrap();
			assert!(!processed.heartbeat.notified);
		}
		let tenth = processor.process(&monitor, &down()).await.unwrap();
		assert!(tenth.heartbeat.notified);
	}

	#[tokio::test]
	async fn recovery_resets_counters_and_pages() {
		let monitor = monitor(0, 5);
		let processor = setup(&monitor).await;

		processor.process(&monitor, &up(10)).await.unwrap();
		processor.process(&monitor, &down()).await.unwrap();
		processor.process(&monitor, &down()).await.unwrap();

		let recovery = processor.process(&monitor, &up(12)).await.unwrap();
		assert_eq!(recovery.heartbeat.status, HeartbeatStatus::Up);
		assert_eq!(recovery.heartbeat.retries, 0);
		assert_eq!(recovery.heartbeat.down_count, 0);
		assert!(recovery.heartbeat.important);
		assert!(recovery.heartbeat.notified);
		assert_eq!(recovery.next_interval, Duration::from_secs(60));
	}

	#[tokio::test]
	async fn maintenance_masking() {
		// Up → Maintenance is important but silent; Maintenance →
		// Maintenance is neither; Maintenance → Up pages.
		let monitor = monitor(0, 0);
		let processor = setup(&monitor).await;

		processor.process(&monitor, &up(10)).await.unwrap();

		let entry = processor
			.process(&monitor, &ProbeOutcome::maintenance(Utc::now()))
			.await
			.unwrap();
		assert!(entry.heartbeat.important);
		assert!(!entry.heartbeat.notified);
		assert_eq!(entry.next_interval, Duration::from_secs(60));

		let inside = processor
			.process(&monitor, &ProbeOutcome::maintenance(Utc::now()))
			.await
			.unwrap();
		assert!(!inside.heartbeat.important);
		assert!(!inside.heartbeat.notified);

		let exit = processor.process(&monitor, &up(9)).await.unwrap();
		assert!(exit.heartbeat.important);
		assert!(exit.heartbeat.notified);
	}

	#[tokio::test]
	async fn maintenance_to_down_pages() {
		let monitor = monitor(0, 0);
		let processor = setup(&monitor).await;

		processor.process(&monitor, &up(10)).await.unwrap();
		processor
			.process(&monitor, &ProbeOutcome::maintenance(Utc::now()))
			.await
			.unwrap();

		let failure = processor.process(&monitor, &down()).await.unwrap();
		assert!(failure.heartbeat.important);
		assert!(failure.heartbeat.notified);
	}

	#[tokio::test]
	async fn down_to_down_without_resend_stays_quiet() {
		let monitor = monitor(0, 0);
		let processor = setup(&monitor).await;

		processor.process(&monitor, &up(10)).await.unwrap();
		processor.process(&monitor, &down()).await.unwrap();

		for _ in 0..3 {
			let processed = processor.process(&monitor, &down()).await.unwrap();
			assert!(!processed.heartbeat.important);
			assert!(!processed.heartbeat.notified);
			assert_eq!(processed.heartbeat.down_count, 0);
		}
	}

	#[tokio::test]
	async fn events_follow_the_notified_flag() {
		use std::sync::atomic::{AtomicUsize, Ordering};
		use vigil_core::EventKind;

		let monitor = monitor(0, 0);
		let pool = create_test_pool().await;
		SqliteMonitorRepository::new(pool.clone())
			.create(&monitor)
			.await
			.unwrap();
		let store = Arc::new(SqliteHeartbeatStore::new(pool));
		let bus = Arc::new(EventBus::new());

		let heartbeats_seen = Arc::new(AtomicUsize::new(0));
		let pages_seen = Arc::new(AtomicUsize::new(0));
		{
			let seen = heartbeats_seen.clone();
			bus.subscribe(EventKind::Heartbeat, move |_| {
				let seen = seen.clone();
				async move {
					seen.fetch_add(1, Ordering::SeqCst);
				}
			})
			.await;
			let seen = pages_seen.clone();
			bus.subscribe(EventKind::StatusChanged, move |_| {
				let seen = seen.clone();
				async move {
					seen.fetch_add(1, Ordering::SeqCst);
				}
			})
			.await;
		}

		let processor = HeartbeatProcessor::new(store, bus);

		processor.process(&monitor, &up(10)).await.unwrap(); // first: pages
		processor.process(&monitor, &up(10)).await.unwrap(); // steady: quiet
		processor.process(&monitor, &down()).await.unwrap(); // transition: pages

		tokio::time::timeout(std::time::Duration::from_secs(2), async {
			while heartbeats_seen.load(Ordering::SeqCst) < 3
				|| pages_seen.load(Ordering::SeqCst) < 2
			{
				tokio::time::sleep(std::time::Duration::from_millis(5)).await;
			}
		})
		.await
		.expect("events were not delivered");

		assert_eq!(heartbeats_seen.load(Ordering::SeqCst), 3);
		assert_eq!(pages_seen.load(Ordering::SeqCst), 2);
	}
}
