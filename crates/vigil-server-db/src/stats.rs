// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Store for statistics roll-up rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use vigil_core::{MonitorId, StatBucket, StatPeriod};

use crate::error::{DbError, Result};
use crate::row::{parse_id, parse_utc};

const STAT_COLUMNS: &str =
	"monitor_id, period, timestamp, ping_avg, ping_min, ping_max, up, down, maintenance";

/// Store for per-bucket roll-up rows, keyed by (monitor, period, bucket start).
#[async_trait]
pub trait StatsStore: Send + Sync {
	async fn get(
		&self,
		monitor_id: MonitorId,
		period: StatPeriod,
		timestamp: DateTime<Utc>,
	) -> Result<Option<StatBucket>>;

	/// Insert or replace a bucket row.
	async fn upsert(&self, bucket: &StatBucket) -> Result<()>;

	/// Sparse read of the rows with `since <= timestamp <= until`, ascending.
	async fn find_range(
		&self,
		monitor_id: MonitorId,
		period: StatPeriod,
		since: DateTime<Utc>,
		until: DateTime<Utc>,
	) -> Result<Vec<StatBucket>>;

	/// Cascade helper for monitor deletion.
	async fn delete_by_monitor(&self, monitor_id: MonitorId) -> Result<u64>;
}

/// SQLite implementation of the stats store.
#[derive(Clone)]
pub struct SqliteStatsStore {
	pool: SqlitePool,
}

impl SqliteStatsStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl StatsStore for SqliteStatsStore {
	#[instrument(skip(self), fields(monitor_id = %monitor_id, period = %period))]
	async fn get(
		&self,
		monitor_id: MonitorId,
		period: StatPeriod,
		timestamp: DateTime<Utc>,
	) -> Result<Option<StatBucket>> {
		let row = sqlx::query_as::<_, StatRow>(&format!(
			"SELECT {STAT_COLUMNS} FROM stats WHERE monitor_id = ? AND period = ? AND timestamp = ?"
		))
		.bind(monitor_id.0.to_string())
		.bind(period.to_string())
		.bind(timestamp.to_rfc3339())
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self, bucket), fields(monitor_id = %bucket.monitor_id, period = %bucket.period))]
	async fn upsert(&self, bucket: &StatBucket) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO stats (
				monitor_id, period, timestamp,
				ping_avg, ping_min, ping_max,
				up, down, maintenance
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT (monitor_id, period, timestamp) DO UPDATE SET
				ping_avg = excluded.ping_avg,
				ping_min = excluded.ping_min,
				ping_max = excluded.ping_max,
				up = excluded.up,
				down = excluded.down,
				maintenance = excluded.maintenance
			"#,
		)
		.bind(bucket.monitor_id.0.to_string())
		.bind(bucket.period.to_string())
		.bind(bucket.timestamp.to_rfc3339())
		.bind(bucket.ping_avg)
		.bind(bucket.ping_min)
		.bind(bucket.ping_max)
		.bind(bucket.up)
		.bind(bucket.down)
		.bind(bucket.maintenance)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self), fields(monitor_id = %monitor_id, period = %period))]
	async fn find_range(
		&self,
		monitor_id: MonitorId,
		period: StatPeriod,
		since: DateTime<Utc>,
		until: DateTime<Utc>,
	) -> Result<Vec<StatBucket>> {
		let rows = sqlx::query_as::<_, StatRow>(&format!(
			"SELECT {STAT_COLUMNS} FROM stats \
			 WHERE monitor_id = ? AND period = ? AND timestamp >= ? AND timestamp <= ? \
			 ORDER BY timestamp ASC"
		))
		.bind(monitor_id.0.to_string())
		.bind(period.to_string())
		.bind(since.to_rfc3339())
		.bind(until.to_rfc3339())
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self), fields(monitor_id = %monitor_id))]
	async fn delete_by_monitor(&self, monitor_id: MonitorId) -> Result<u64> {
		let result = sqlx::query("DELETE FROM stats WHERE monitor_id = ?")
			.bind(monitor_id.0.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected())
	}
}

#[derive(sqlx::FromRow)]
struct StatRow {
	monitor_id: String,
	period: String,
	timestamp: String,
	ping_avg: f64,
	ping_min: i64,
	ping_max: i64,
	up: i64,
	down: i64,
	maintenance: i64,
}

impl TryFrom<StatRow> for StatBucket {
	type Error = DbError;

	fn try_from(row: StatRow) -> Result<Self> {
		Ok(StatBucket {
			monitor_id: parse_id(&row.monitor_id, "monitor id")?,
			period: row
				.period
				.parse()
				.map_err(|_| DbError::CorruptRow(format!("invalid period: {}", row.period)))?,
			timestamp: parse_utc(&row.timestamp, "timestamp")?,
			ping_avg: row.ping_avg,
			ping_min: row.ping_min,
			ping_max: row.ping_max,
			up: row.up,
			down: row.down,
			maintenance: row.maintenance,
		})
	}
}
