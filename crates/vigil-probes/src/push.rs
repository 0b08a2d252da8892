// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Push (dead-man-switch) probe.
//!
//! Push monitors receive their real heartbeats from an external party calling
//! the push endpoint. This executor only watches for silence: when the latest
//! heartbeat is older than the monitor's interval plus grace, it reports Down;
//! otherwise it skips the tick.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;

use vigil_core::{HeartbeatStatus, Monitor, ProbeOutcome, Proxy};
use vigil_server_db::HeartbeatStore;

use crate::{Probe, ProbeError, Result};

/// Per-monitor options for the push probe.
#[derive(Debug, Clone, Default, Deserialize)]
struct PushConfig {
	/// Extra seconds of silence tolerated beyond the interval.
	#[serde(default)]
	grace_secs: u32,
}

/// Dead-man-switch probe for push monitors.
pub struct PushProbe {
	heartbeats: Arc<dyn HeartbeatStore>,
}

impl PushProbe {
	pub fn new(heartbeats: Arc<dyn HeartbeatStore>) -> Self {
		Self { heartbeats }
	}

	fn parse_config(config: &serde_json::Value) -> Result<PushConfig> {
		if config.is_null() {
			return Ok(PushConfig::default());
		}
		serde_json::from_value(config.clone()).map_err(|e| ProbeError::InvalidConfig(e.to_string()))
	}
}

#[async_trait]
impl Probe for PushProbe {
	fn kind(&self) -> &'static str {
		"push"
	}

	fn validate(&self, config: &serde_json::Value) -> Result<()> {
		Self::parse_config(config).map(|_| ())
	}

	async fn execute(
		&self,
		monitor: &Monitor,
		_proxy: Option<&Proxy>,
	) -> Result<Option<ProbeOutcome>> {
		let now = Utc::now();

		let config = match Self::parse_config(&monitor.config) {
			Ok(config) => config,
			Err(e) => return Ok(Some(ProbeOutcome::down(e.to_string(), now))),
		};

		let Some(latest) = self.heartbeats.latest_by_monitor(monitor.id).await? else {
			// Nothing received yet; there is no baseline to measure silence
			// against, so the external party gets to make the first move.
			return Ok(None);
		};

		// Once the monitor is Down, keep beating Down on every tick so the
		// retry/resend machinery sees a continuous Down sequence.
		if latest.status == HeartbeatStatus::Down {
			return Ok(Some(ProbeOutcome::down(
				format!("no heartbeat received for {}", monitor.name),
				now,
			)));
		}

		let allowed = Duration::seconds(i64::from(monitor.interval_secs + config.grace_secs));
		if now - latest.time > allowed {
			return Ok(Some(ProbeOutcome::down(
				format!(
					"no heartbeat received within {} seconds",
					allowed.num_seconds()
				),
				now,
			)));
		}

		Ok(None)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use vigil_core::{Heartbeat, HeartbeatId, MonitorId};
	use vigil_server_db::{
		testing::create_test_pool, MonitorRepository, SqliteHeartbeatStore, SqliteMonitorRepository,
	};

	fn push_monitor() -> Monitor {
		Monitor {
			id: MonitorId::new(),
			name: "backup job".to_string(),
			kind: "push".to_string(),
			active: true,
			interval_secs: 60,
			timeout_secs: 16,
			max_retries: 0,
			retry_interval_secs: 30,
			resend_interval: 0,
			proxy_id: None,
			push_token: Some(Monitor::generate_push_token()),
			config: serde_json::json!({}),
			created_at: Utc::now(),
			updated_at: Utc::now(),
		}
	}

	async fn setup(monitor: &Monitor) -> (Arc<SqliteHeartbeatStore>, PushProbe) {
		let pool = create_test_pool().await;
		SqliteMonitorRepository::new(pool.clone())
			.create(monitor)
			.await
			.unwrap();
		let store = Arc::new(SqliteHeartbeatStore::new(pool));
		let probe = PushProbe::new(store.clone());
		(store, probe)
	}

	fn beat_at(monitor_id: MonitorId, status: HeartbeatStatus, age_secs: i64) -> Heartbeat {
		let time = Utc::now() - Duration::seconds(age_secs);
		Heartbeat {
			id: HeartbeatId::new(),
			monitor_id,
			status,
			msg: "OK".to_string(),
			ping_ms: 0,
			retries: 0,
			down_count: 0,
			important: false,
			notified: false,
			time,
			end_time: time,
		}
	}

	#[tokio::test]
	async fn skips_without_any_baseline() {
		let monitor = push_monitor();
		let (_store, probe) = setup(&monitor).await;

		assert!(probe.execute(&monitor, None).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn skips_while_fresh() {
		let monitor = push_monitor();
		let (store, probe) = setup(&monitor).await;
		store
			.create(&beat_at(monitor.id, HeartbeatStatus::Up, 10))
			.await
			.unwrap();

		assert!(probe.execute(&monitor, None).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn down_when_silence_exceeds_interval() {
		let monitor = push_monitor();
		let (store, probe) = setup(&monitor).await;
		store
			.create(&beat_at(monitor.id, HeartbeatStatus::Up, 120))
			.await
			.unwrap();

		let outcome = probe.execute(&monitor, None).await.unwrap().unwrap();
		assert_eq!(outcome.status, HeartbeatStatus::Down);
	}

	#[tokio::test]
	async fn grace_extends_the_allowance() {
		let mut monitor = push_monitor();
		monitor.config = serde_json::json!({"grace_secs": 120});
		let (store, probe) = setup(&monitor).await;
		store
			.create(&beat_at(monitor.id, HeartbeatStatus::Up, 120))
			.await
			.unwrap();

		assert!(probe.execute(&monitor, None).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn keeps_beating_down_once_down() {
		let monitor = push_monitor();
		let (store, probe) = setup(&monitor).await;
		store
			.create(&beat_at(monitor.id, HeartbeatStatus::Down, 5))
			.await
			.unwrap();

		let outcome = probe.execute(&monitor, None).await.unwrap().unwrap();
		assert_eq!(outcome.status, HeartbeatStatus::Down);
	}
}
