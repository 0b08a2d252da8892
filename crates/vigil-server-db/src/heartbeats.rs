// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Append-only heartbeat store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use vigil_core::{Heartbeat, HeartbeatId, HeartbeatStatus, MonitorId};

use crate::error::{DbError, Result};
use crate::row::{parse_id, parse_utc};

const HEARTBEAT_COLUMNS: &str = "id, monitor_id, status, msg, ping_ms, retries, down_count, \
	important, notified, time, end_time";

/// Append-only log of probe outcomes per monitor.
///
/// Within a single monitor, paginated reads are strict reverse chronological
/// order by `time` (unless `reverse` flips them).
#[async_trait]
pub trait HeartbeatStore: Send + Sync {
	/// Persist a heartbeat. The caller provides the identity; the record is
	/// immutable afterwards.
	async fn create(&self, heartbeat: &Heartbeat) -> Result<()>;

	/// The most recent heartbeat for a monitor, if any.
	async fn latest_by_monitor(&self, monitor_id: MonitorId) -> Result<Option<Heartbeat>>;

	/// Paginated read, most-recent-first by default.
	async fn find_by_monitor_paginated(
		&self,
		monitor_id: MonitorId,
		limit: u32,
		offset: u32,
		important_only: bool,
		reverse: bool,
	) -> Result<Vec<Heartbeat>>;

	/// Retention trimming. Returns the number of rows deleted.
	async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;

	/// Cascade helper for monitor deletion.
	async fn delete_by_monitor(&self, monitor_id: MonitorId) -> Result<u64>;
}

/// SQLite implementation of the heartbeat store.
#[derive(Clone)]
pub struct SqliteHeartbeatStore {
	pool: SqlitePool,
}

impl SqliteHeartbeatStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl HeartbeatStore for SqliteHeartbeatStore {
	#[instrument(skip(self, heartbeat), fields(monitor_id = %heartbeat.monitor_id, status = %heartbeat.status))]
	async fn create(&self, heartbeat: &Heartbeat) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO heartbeats (
				id, monitor_id, status, msg, ping_ms,
				retries, down_count, important, notified,
				time, end_time
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(heartbeat.id.0.to_string())
		.bind(heartbeat.monitor_id.0.to_string())
		.bind(heartbeat.status.code())
		.bind(&heartbeat.msg)
		.bind(heartbeat.ping_ms)
		.bind(heartbeat.retries as i64)
		.bind(heartbeat.down_count as i64)
		.bind(heartbeat.important)
		.bind(heartbeat.notified)
		.bind(heartbeat.time.to_rfc3339())
		.bind(heartbeat.end_time.to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self), fields(monitor_id = %monitor_id))]
	async fn latest_by_monitor(&self, monitor_id: MonitorId) -> Result<Option<Heartbeat>> {
		let row = sqlx::query_as::<_, HeartbeatRow>(&format!(
			"SELECT {HEARTBEAT_COLUMNS} FROM heartbeats WHERE monitor_id = ? ORDER BY time DESC LIMIT 1"
		))
		.bind(monitor_id.0.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self), fields(monitor_id = %monitor_id, limit, offset))]
	async fn find_by_monitor_paginated(
		&self,
		monitor_id: MonitorId,
		limit: u32,
		offset: u32,
		important_only: bool,
		reverse: bool,
	) -> Result<Vec<Heartbeat>> {
		let order = if reverse { "ASC" } else { "DESC" };
		let filter = if important_only {
			"AND important = 1"
		} else {
			""
		};

		let rows = sqlx::query_as::<_, HeartbeatRow>(&format!(
			"SELECT {HEARTBEAT_COLUMNS} FROM heartbeats \
			 WHERE monitor_id = ? {filter} \
			 ORDER BY time {order} \
			 LIMIT ? OFFSET ?"
		))
		.bind(monitor_id.0.to_string())
		.bind(limit as i64)
		.bind(offset as i64)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self))]
	async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
		let result = sqlx::query("DELETE FROM heartbeats WHERE time < ?")
			.bind(cutoff.to_rfc3339())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected())
	}

	#[instrument(skip(self), fields(monitor_id = %monitor_id))]
	async fn delete_by_monitor(&self, monitor_id: MonitorId) -> Result<u64> {
		let result = sqlx::query("DELETE FROM heartbeats WHERE monitor_id = ?")
			.bind(monitor_id.0.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected())
	}
}

#[derive(sqlx::FromRow)]
struct HeartbeatRow {
	id: String,
	monitor_id: String,
	status: i64,
	msg: String,
	ping_ms: i64,
	retries: i64,
	down_count: i64,
	important: bool,
	notified: bool,
	time: String,
	end_time: String,
}

impl TryFrom<HeartbeatRow> for Heartbeat {
	type Error = DbError;

	fn try_from(row: HeartbeatRow) -> Result<Self> {
		Ok(Heartbeat {
			id: parse_id(&row.id, "heartbeat id")?,
			monitor_id: parse_id(&row.monitor_id, "monitor id")?,
			status: HeartbeatStatus::from_code(row.status)
				.ok_or_else(|| DbError::CorruptRow(format!("invalid status code: {}", row.status)))?,
			msg: row.msg,
			ping_ms: row.ping_ms,
			retries: row.retries as u32,
			down_count: row.down_count as u32,
			important: row.important,
			notified: row.notified,
			time: parse_utc(&row.time, "time")?,
			end_time: parse_utc(&row.end_time, "end_time")?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::monitors::{MonitorRepository, SqliteMonitorRepository};
	use crate::testing::create_test_pool;
	use chrono::Duration;
	use vigil_core::Monitor;

	async fn seeded_monitor(pool: &SqlitePool) -> MonitorId {
		let repo = SqliteMonitorRepository::new(pool.clone());
		let monitor = Monitor {
			id: MonitorId::new(),
			name: "db test".to_string(),
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
		repo.create(&monitor).await.unwrap();
		monitor.id
	}

	fn beat(monitor_id: MonitorId, status: HeartbeatStatus, time: DateTime<Utc>) -> Heartbeat {
		Heartbeat {
			id: HeartbeatId::new(),
			monitor_id,
			status,
			msg: "test".to_string(),
			ping_ms: 12,
			retries: 0,
			down_count: 0,
			important: status == HeartbeatStatus::Down,
			notified: false,
			time,
			end_time: time,
		}
	}

	#[tokio::test]
	async fn latest_returns_most_recent() {
		let pool = create_test_pool().await;
		let store = SqliteHeartbeatStore::new(pool.clone());
		let monitor_id = seeded_monitor(&pool).await;

		let base = Utc::now();
		store
			.create(&beat(monitor_id, HeartbeatStatus::Up, base - Duration::seconds(120)))
			.await
			.unwrap();
		store
			.create(&beat(monitor_id, HeartbeatStatus::Down, base))
			.await
			.unwrap();

		let latest = store.latest_by_monitor(monitor_id).await.unwrap().unwrap();
		assert_eq!(latest.status, HeartbeatStatus::Down);
	}

	#[tokio::test]
	async fn latest_absent_for_fresh_monitor() {
		let pool = create_test_pool().await;
		let store = SqliteHeartbeatStore::new(pool.clone());
		let monitor_id = seeded_monitor(&pool).await;

		assert!(store.latest_by_monitor(monitor_id).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn paginated_reads_are_reverse_chronological() {
		let pool = create_test_pool().await;
		let store = SqliteHeartbeatStore::new(pool.clone());
		let monitor_id = seeded_monitor(&pool).await;

		let base = Utc::now();
		for i in 0..5 {
			store
				.create(&beat(
					monitor_id,
					HeartbeatStatus::Up,
					base + Duration::seconds(i * 60),
				))
				.await
				.unwrap();
		}

		let page = store
			.find_by_monitor_paginated(monitor_id, 3, 0, false, false)
			.await
			.unwrap();
		assert_eq!(page.len(), 3);
		assert!(page.windows(2).all(|w| w[0].time > w[1].time));
		assert_eq!(page[0].time, base + Duration::seconds(240));

		let next_page = store
			.find_by_monitor_paginated(monitor_id, 3, 3, false, false)
			.await
			.unwrap();
		assert_eq!(next_page.len(), 2);
		assert!(next_page[0].time < page[2].time);
	}

	#[tokio::test]
	async fn important_filter() {
		let pool = create_test_pool().await;
		let store = SqliteHeartbeatStore::new(pool.clone());
		let monitor_id = seeded_monitor(&pool).await;

		let base = Utc::now();
		store
			.create(&beat(monitor_id, HeartbeatStatus::Up, base))
			.await
			.unwrap();
		store
			.create(&beat(monitor_id, HeartbeatStatus::Down, base + Duration::seconds(60)))
			.await
			.unwrap();

		let important = store
			.find_by_monitor_paginated(monitor_id, 10, 0, true, false)
			.await
			.unwrap();
		assert_eq!(important.len(), 1);
		assert_eq!(important[0].status, HeartbeatStatus::Down);
	}

	#[tokio::test]
	async fn delete_older_than_counts_rows() {
		let pool = create_test_pool().await;
		let store = SqliteHeartbeatStore::new(pool.clone());
		let monitor_id = seeded_monitor(&pool).await;

		let base = Utc::now();
		store
			.create(&beat(monitor_id, HeartbeatStatus::Up, base - Duration::days(400)))
			.await
			.unwrap();
		store
			.create(&beat(monitor_id, HeartbeatStatus::Up, base - Duration::days(10)))
			.await
			.unwrap();
		store
			.create(&beat(monitor_id, HeartbeatStatus::Up, base))
			.await
			.unwrap();

		let deleted = store
			.delete_older_than(base - Duration::days(365))
			.await
			.unwrap();
		assert_eq!(deleted, 1);

		let remaining = store
			.find_by_monitor_paginated(monitor_id, 10, 0, false, false)
			.await
			.unwrap();
		assert_eq!(remaining.len(), 2);
	}

	#[tokio::test]
	async fn monitor_deletion_cascades() {
		let pool = create_test_pool().await;
		let store = SqliteHeartbeatStore::new(pool.clone());
		let repo = SqliteMonitorRepository::new(pool.clone());
		let monitor_id = seeded_monitor(&pool).await;

		store
			.create(&beat(monitor_id, HeartbeatStatus::Up, Utc::now()))
			.await
			.unwrap();

		repo.delete(monitor_id).await.unwrap();

		let remaining = store
			.find_by_monitor_paginated(monitor_id, 10, 0, false, false)
			.await
			.unwrap();
		assert!(remaining.is_empty());
	}
}
