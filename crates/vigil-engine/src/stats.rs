// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Statistics aggregation.
//!
//! Subscribes to heartbeat events and maintains minutely/hourly/daily roll-up
//! rows per monitor. Reads materialize missing buckets as zero rows so a
//! range query always yields one entry per bucket.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, instrument};

use vigil_core::{
	EngineEvent, EventKind, Heartbeat, HeartbeatStatus, MonitorId, StatBucket, StatPeriod,
	StatSummary,
};
use vigil_server_db::StatsStore;

use crate::bus::EventBus;
use crate::error::Result;

/// Maintains the per-period roll-ups for every monitor.
pub struct StatsAggregator {
	store: Arc<dyn StatsStore>,
}

impl StatsAggregator {
	pub fn new(store: Arc<dyn StatsStore>) -> Self {
		Self { store }
	}

	/// Subscribe to heartbeat events on the bus.
	pub async fn attach(self: &Arc<Self>, bus: &EventBus) {
		let aggregator = Arc::clone(self);
		bus.subscribe(EventKind::Heartbeat, move |event| {
			let aggregator = Arc::clone(&aggregator);
			async move {
				if let EngineEvent::Heartbeat(heartbeat) = event {
					if let Err(e) = aggregator.record(&heartbeat).await {
						error!(monitor_id = %heartbeat.monitor_id, error = %e, "failed to record stats");
					}
				}
			}
		})
		.await;
	}

	/// Fold one heartbeat into its minutely, hourly and daily buckets.
	#[instrument(skip(self, heartbeat), fields(monitor_id = %heartbeat.monitor_id))]
	pub async fn record(&self, heartbeat: &Heartbeat) -> Result<()> {
		for period in StatPeriod::ALL {
			let timestamp = period.truncate(heartbeat.time);
			let mut bucket = self
				.store
				.get(heartbeat.monitor_id, period, timestamp)
				.await?
				.unwrap_or_else(|| StatBucket::zero(heartbeat.monitor_id, period, timestamp));

			fold(&mut bucket, heartbeat);
			self.store.upsert(&bucket).await?;
		}
		Ok(())
	}

	/// Densely materialized range read: one bucket per step from the start of
	/// `since`'s bucket through `until`, zero rows where nothing was recorded.
	#[instrument(skip(self), fields(monitor_id = %monitor_id, period = %period))]
	pub async fn find_by_range(
		&self,
		monitor_id: MonitorId,
		since: DateTime<Utc>,
		until: DateTime<Utc>,
		period: StatPeriod,
	) -> Result<Vec<StatBucket>> {
		let start = period.truncate(since);
		let sparse = self
			.store
			.find_range(monitor_id, period, start, until)
			.await?;

		let mut by_ts: HashMap<i64, StatBucket> = sparse
			.into_iter()
			.map(|bucket| (bucket.timestamp.timestamp(), bucket))
			.collect();

		let step = Duration::seconds(period.bucket_secs());
		let mut out = Vec::new();
		let mut cursor = start;
		while cursor <= until {
			out.push(
				by_ts
					.remove(&cursor.timestamp())
					.unwrap_or_else(|| StatBucket::zero(monitor_id, period, cursor)),
			);
			cursor += step;
		}

		Ok(out)
	}

	/// Aggregate summary over already-fetched buckets.
	pub fn summarize(buckets: &[StatBucket]) -> StatSummary {
		let up: i64 = buckets.iter().map(|b| b.up).sum();
		let down: i64 = buckets.iter().map(|b| b.down).sum();
		let maintenance: i64 = buckets.iter().map(|b| b.maintenance).sum();
		let total = up + down + maintenance;

		let weighted_ping: f64 = buckets.iter().map(|b| b.ping_avg * b.up as f64).sum();
		let ping_avg = if up > 0 { weighted_ping / up as f64 } else { 0.0 };

		let ping_min = buckets
			.iter()
			.map(|b| b.ping_min)
			.filter(|min| *min > 0)
			.min()
			.unwrap_or(0);
		let ping_max = buckets.iter().map(|b| b.ping_max).max().unwrap_or(0);

		let (uptime, maintenance_pct) = if total > 0 {
			(
				up as f64 / total as f64 * 100.0,
				maintenance as f64 / total as f64 * 100.0,
			)
		} else {
			(0.0, 0.0)
		};

		StatSummary {
			ping_avg,
			ping_min,
			ping_max,
			uptime,
			maintenance_pct,
		}
	}
}

/// Fold one heartbeat into a bucket.
///
/// Up and Maintenance flatten to the `up` counter, Down and Pending to
/// `down`; `maintenance` counts raw Maintenance beats only. Ping statistics
/// move only on raw Up, with the running average weighted by the previous
/// `up` count and the minimum tracking the smallest non-zero ping.
fn fold(bucket: &mut StatBucket, heartbeat: &Heartbeat) {
	if heartbeat.status == HeartbeatStatus::Up {
		let up_prev = bucket.up as f64;
		let ping = heartbeat.ping_ms as f64;
		bucket.ping_avg = (bucket.ping_avg * up_prev + ping) / (up_prev + 1.0);

		if heartbeat.ping_ms > 0
			&& (bucket.ping_min == 0 || heartbeat.ping_ms < bucket.ping_min)
		{
			bucket.ping_min = heartbeat.ping_ms;
		}
		if heartbeat.ping_ms > bucket.ping_max {
			bucket.ping_max = heartbeat.ping_ms;
		}
	}

	if heartbeat.status.is_counted_up() {
		bucket.up += 1;
	} else {
		bucket.down += 1;
	}
	if heartbeat.status == HeartbeatStatus::Maintenance {
		bucket.maintenance += 1;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use vigil_core::{HeartbeatId, Monitor};
	use vigil_server_db::{
		testing::create_test_pool, MonitorRepository, SqliteMonitorRepository, SqliteStatsStore,
	};

	fn beat(monitor_id: MonitorId, status: HeartbeatStatus, ping: i64, time: DateTime<Utc>) -> Heartbeat {
		Heartbeat {
			id: HeartbeatId::new(),
			monitor_id,
			status,
			msg: String::new(),
			ping_ms: ping,
			retries: 0,
			down_count: 0,
			important: false,
			notified: false,
			time,
			end_time: time,
		}
	}

	async fn setup() -> (StatsAggregator, MonitorId) {
		let pool = create_test_pool().await;
		let monitors = SqliteMonitorRepository::new(pool.clone());
		let monitor = Monitor {
			id: MonitorId::new(),
			name: "stats".to_string(),
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
		monitors.create(&monitor).await.unwrap();

		let store = Arc::new(SqliteStatsStore::new(pool));
		(StatsAggregator::new(store), monitor.id)
	}

	#[test]
	fn fold_first_up_sets_all_three_pings() {
		let monitor_id = MonitorId::new();
		let mut bucket = StatBucket::zero(monitor_id, StatPeriod::Minute, Utc::now());

		fold(&mut bucket, &beat(monitor_id, HeartbeatStatus::Up, 45, Utc::now()));

		assert_eq!(bucket.up, 1);
		assert_eq!(bucket.ping_avg, 45.0);
		assert_eq!(bucket.ping_min, 45);
		assert_eq!(bucket.ping_max, 45);
	}

	#[test]
	fn fold_running_average_uses_previous_up_count() {
		let monitor_id = MonitorId::new();
		let mut bucket = StatBucket::zero(monitor_id, StatPeriod::Minute, Utc::now());

		fold(&mut bucket, &beat(monitor_id, HeartbeatStatus::Up, 40, Utc::now()));
		fold(&mut bucket, &beat(monitor_id, HeartbeatStatus::Up, 60, Utc::now()));

		assert_eq!(bucket.up, 2);
		assert_eq!(bucket.ping_avg, 50.0);
		assert_eq!(bucket.ping_min, 40);
		assert_eq!(bucket.ping_max, 60);
	}

	#[test]
	fn fold_flat_status_mapping() {
		let monitor_id = MonitorId::new();
		let mut bucket = StatBucket::zero(monitor_id, StatPeriod::Minute, Utc::now());

		fold(&mut bucket, &beat(monitor_id, HeartbeatStatus::Up, 40, Utc::now()));
		fold(&mut bucket, &beat(monitor_id, HeartbeatStatus::Down, 0, Utc::now()));
		fold(&mut bucket, &beat(monitor_id, HeartbeatStatus::Pending, 0, Utc::now()));
		fold(&mut bucket, &beat(monitor_id, HeartbeatStatus::Maintenance, 0, Utc::now()));

		assert_eq!(bucket.up, 2); // Up + Maintenance
		assert_eq!(bucket.down, 2); // Down + Pending
		assert_eq!(bucket.maintenance, 1);
		// Ping untouched by non-Up beats.
		assert_eq!(bucket.ping_avg, 40.0);
		assert_eq!(bucket.ping_min, 40);
	}

	#[test]
	fn fold_ignores_zero_ping_for_min() {
		let monitor_id = MonitorId::new();
		let mut bucket = StatBucket::zero(monitor_id, StatPeriod::Minute, Utc::now());

		fold(&mut bucket, &beat(monitor_id, HeartbeatStatus::Up, 0, Utc::now()));
		fold(&mut bucket, &beat(monitor_id, HeartbeatStatus::Up, 30, Utc::now()));

		assert_eq!(bucket.ping_min, 30);
	}

	#[tokio::test]
	async fn record_updates_all_three_periods() {
		let (aggregator, monitor_id) = setup().await;
		let time = Utc.with_ymd_and_hms(2025, 1, 15, 2, 17, 43).unwrap();

		aggregator
			.record(&beat(monitor_id, HeartbeatStatus::Up, 45, time))
			.await
			.unwrap();

		for period in StatPeriod::ALL {
			let rows = aggregator
				.find_by_range(monitor_id, time, time, period)
				.await
				.unwrap();
			assert_eq!(rows.len(), 1, "{period}");
			assert_eq!(rows[0].up, 1, "{period}");
			assert_eq!(rows[0].timestamp, period.truncate(time), "{period}");
		}
	}

	#[tokio::test]
	async fn range_is_dense_with_one_entry_per_bucket() {
		let (aggregator, monitor_id) = setup().await;
		let base = Utc.with_ymd_and_hms(2025, 1, 15, 2, 0, 0).unwrap();

		// Beats land in buckets 0 and 3 only.
		aggregator
			.record(&beat(monitor_id, HeartbeatStatus::Up, 45, base))
			.await
			.unwrap();
		aggregator
			.record(&beat(
				monitor_id,
				HeartbeatStatus::Down,
				0,
				base + Duration::minutes(3),
			))
			.await
			.unwrap();

		let rows = aggregator
			.find_by_range(monitor_id, base, base + Duration::minutes(5), StatPeriod::Minute)
			.await
			.unwrap();

		// floor((until - since) / bucket) + 1 entries.
		assert_eq!(rows.len(), 6);
		let timestamps: Vec<_> = rows.iter().map(|r| r.timestamp).collect();
		let mut unique = timestamps.clone();
		unique.dedup();
		assert_eq!(timestamps, unique);
		assert_eq!(rows[0].up, 1);
		assert!(rows[1].is_empty());
		assert!(rows[2].is_empty());
		assert_eq!(rows[3].down, 1);
		assert!(rows[4].is_empty());
		assert!(rows[5].is_empty());
	}

	#[test]
	fn summary_formulas() {
		let monitor_id = MonitorId::new();
		let ts = Utc::now();

		let mut a = StatBucket::zero(monitor_id, StatPeriod::Hour, ts);
		a.up = 2;
		a.ping_avg = 40.0;
		a.ping_min = 30;
		a.ping_max = 50;

		let mut b = StatBucket::zero(monitor_id, StatPeriod::Hour, ts);
		b.up = 1;
		b.down = 1;
		b.ping_avg = 70.0;
		b.ping_min = 70;
		b.ping_max = 70;

		let mut c = StatBucket::zero(monitor_id, StatPeriod::Hour, ts);
		c.up = 1;
		c.maintenance = 1;

		let summary = StatsAggregator::summarize(&[a, b, c]);

		// (40*2 + 70*1 + 0*1) / 4
		assert_eq!(summary.ping_avg, 37.5);
		assert_eq!(summary.ping_min, 30);
		assert_eq!(summary.ping_max, 70);
		// 4 up / (4 + 1 + 1) total
		assert!((summary.uptime - 66.6666).abs() < 0.01);
		assert!((summary.maintenance_pct - 16.6666).abs() < 0.01);
	}

	#[test]
	fn summary_of_nothing_is_zero() {
		let summary = StatsAggregator::summarize(&[]);
		assert_eq!(summary.ping_avg, 0.0);
		assert_eq!(summary.uptime, 0.0);
	}

	#[tokio::test]
	async fn attach_records_heartbeat_events() {
		let (aggregator, monitor_id) = setup().await;
		let aggregator = Arc::new(aggregator);
		let bus = EventBus::new();
		aggregator.attach(&bus).await;

		let time = Utc.with_ymd_and_hms(2025, 1, 15, 2, 0, 0).unwrap();
		bus.publish(EngineEvent::Heartbeat(beat(
			monitor_id,
			HeartbeatStatus::Up,
			45,
			time,
		)))
		.await;

		// Handler runs on its own task; poll until it lands.
		tokio::time::timeout(std::time::Duration::from_secs(2), async {
			loop {
				let rows = aggregator
					.find_by_range(monitor_id, time, time, StatPeriod::Minute)
					.await
					.unwrap();
				if rows[0].up == 1 {
					break;
				}
				tokio::time::sleep(std::time::Duration::from_millis(10)).await;
			}
		})
		.await
		.expect("stats were not recorded");
	}
}
