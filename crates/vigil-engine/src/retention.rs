// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Heartbeat retention pruning.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{instrument, warn};

use vigil_server_db::{HeartbeatStore, SettingsRepository, KEEP_DATA_PERIOD_DAYS};

use crate::error::Result;
use crate::jobs::Job;

/// Default retention window, in days.
pub const DEFAULT_KEEP_DATA_PERIOD_DAYS: i64 = 365;

/// How often the retention job runs.
pub const RETENTION_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3600);

/// Hourly job that prunes heartbeats older than the configured retention
/// window.
pub struct RetentionJob {
	heartbeats: Arc<dyn HeartbeatStore>,
	settings: Arc<dyn SettingsRepository>,
}

impl RetentionJob {
	pub fn new(heartbeats: Arc<dyn HeartbeatStore>, settings: Arc<dyn SettingsRepository>) -> Self {
		Self {
			heartbeats,
			settings,
		}
	}

	/// The retention window in days, falling back to the default when the
	/// setting is absent or malformed.
	async fn retention_days(&self) -> Result<i64> {
		let raw = self.settings.get(KEEP_DATA_PERIOD_DAYS).await?;
		let days = match raw {
			None => {
				warn!(
					default = DEFAULT_KEEP_DATA_PERIOD_DAYS,
					"{KEEP_DATA_PERIOD_DAYS} is not set, using default"
				);
				DEFAULT_KEEP_DATA_PERIOD_DAYS
			}
			Some(value) => match value.parse::<i64>() {
				Ok(days) if days > 0 => days,
				_ => {
					warn!(
						value = %value,
						default = DEFAULT_KEEP_DATA_PERIOD_DAYS,
						"{KEEP_DATA_PERIOD_DAYS} is malformed, using default"
					);
					DEFAULT_KEEP_DATA_PERIOD_DAYS
				}
			},
		};
		Ok(days)
	}
}

#[async_trait]
impl Job for RetentionJob {
	fn id(&self) -> &str {
		"heartbeat-retention"
	}

	fn name(&self) -> &str {
		"Heartbeat Retention"
	}

	#[instrument(skip(self), fields(job_id = "heartbeat-retention"))]
	async fn run(&self) -> Result<String> {
		let days = self.retention_days().await?;
		let cutoff = Utc::now() - Duration::days(days);
		let deleted = self.heartbeats.delete_older_than(cutoff).await?;

		Ok(format!("pruned {deleted} heartbeats older than {days} days"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use vigil_core::{Heartbeat, HeartbeatId, HeartbeatStatus, Monitor, MonitorId};
	use vigil_server_db::{
		testing::create_test_pool, MonitorRepository, SqliteHeartbeatStore, SqliteMonitorRepository,
		SqliteSettingsRepository,
	};

	async fn setup() -> (RetentionJob, Arc<SqliteHeartbeatStore>, Arc<SqliteSettingsRepository>, MonitorId) {
		let pool = create_test_pool().await;

		let monitor = Monitor {
			id: MonitorId::new(),
			name: "retention".to_string(),
			kind: "http".to_string(),
			active: true,
			interval_secs: 60,
			timeout_secs: 16,
			max_retries: 0,
			retry_interval_secs: 30,
			resend_interval: 0,
			proxy_id: None,
			push_token: None,
			config: serde_json::json!({}),
			created_at: Utc::now(),
			updated_at: Utc::now(),
		};
		SqliteMonitorRepository::new(pool.clone())
			.create(&monitor)
			.await
			.unwrap();

		let heartbeats = Arc::new(SqliteHeartbeatStore::new(pool.clone()));
		let settings = Arc::new(SqliteSettingsRepository::new(pool));
		let job = RetentionJob::new(heartbeats.clone(), settings.clone());
		(job, heartbeats, settings, monitor.id)
	}

	async fn seed_beat(store: &SqliteHeartbeatStore, monitor_id: MonitorId, age_days: i64) {
		let time = Utc::now() - Duration::days(age_days);
		store
			.create(&Heartbeat {
				id: HeartbeatId::new(),
				monitor_id,
				status: HeartbeatStatus::Up,
				msg: "ok".to_string(),
				ping_ms: 1,
				retries: 0,
				down_count: 0,
				important: false,
				notified: false,
				time,
				end_time: time,
			})
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn prunes_beyond_configured_window() {
		let (job, heartbeats, settings, monitor_id) = setup().await;
		settings.set(KEEP_DATA_PERIOD_DAYS, "30", "int").await.unwrap();

		seed_beat(&heartbeats, monitor_id, 40).await;
		seed_beat(&heartbeats, monitor_id, 10).await;

		let outcome = job.run().await.unwrap();
		assert!(outcome.contains("pruned 1"));

		let remaining = heartbeats
			.find_by_monitor_paginated(monitor_id, 10, 0, false, false)
			.await
			.unwrap();
		assert_eq!(remaining.len(), 1);
	}

	#[tokio::test]
	async fn missing_setting_uses_default() {
		let (job, heartbeats, _settings, monitor_id) = setup().await;

		seed_beat(&heartbeats, monitor_id, 400).await;
		seed_beat(&heartbeats, monitor_id, 100).await;

		let outcome = job.run().await.unwrap();
		assert!(outcome.contains("pruned 1"));
		assert!(outcome.contains("365"));
	}

	#[tokio::test]
	async fn malformed_setting_uses_default() {
		let (job, heartbeats, settings, monitor_id) = setup().await;
		settings
			.set(KEEP_DATA_PERIOD_DAYS, "forever", "int")
			.await
			.unwrap();

		seed_beat(&heartbeats, monitor_id, 400).await;

		let outcome = job.run().await.unwrap();
		assert!(outcome.contains("365"));
	}
}
