// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository for monitor records.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::instrument;

use vigil_core::{Monitor, MonitorId, ProxyId};

use crate::error::Result;
use crate::row::{parse_id, parse_utc};

const MONITOR_COLUMNS: &str = "id, name, kind, active, interval_secs, timeout_secs, \
	max_retries, retry_interval_secs, resend_interval, proxy_id, push_token, config, \
	created_at, updated_at";

/// Repository trait for monitor operations.
///
/// Mutations are driven by the external API layer; the engine reads.
#[async_trait]
pub trait MonitorRepository: Send + Sync {
	async fn create(&self, monitor: &Monitor) -> Result<()>;
	async fn get_by_id(&self, id: MonitorId) -> Result<Option<Monitor>>;
	async fn get_by_push_token(&self, token: &str) -> Result<Option<Monitor>>;
	async fn list_active(&self) -> Result<Vec<Monitor>>;
	/// Monitors whose outbound traffic rides the given proxy.
	async fn list_by_proxy(&self, proxy_id: ProxyId) -> Result<Vec<Monitor>>;
	async fn update(&self, monitor: &Monitor) -> Result<()>;
	async fn delete(&self, id: MonitorId) -> Result<bool>;
}

/// SQLite implementation of the monitor repository.
#[derive(Clone)]
pub struct SqliteMonitorRepository {
	pool: SqlitePool,
}

impl SqliteMonitorRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl MonitorRepository for SqliteMonitorRepository {
	#[instrument(skip(self, monitor), fields(monitor_id = %monitor.id, kind = %monitor.kind))]
	async fn create(&self, monitor: &Monitor) -> Result<()> {
		let config = serde_json::to_string(&monitor.config)?;

		sqlx::query(
			r#"
			INSERT INTO monitors (
				id, name, kind, active,
				interval_secs, timeout_secs, max_retries, retry_interval_secs, resend_interval,
				proxy_id, push_token, config,
				created_at, updated_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(monitor.id.0.to_string())
		.bind(&monitor.name)
		.bind(&monitor.kind)
		.bind(monitor.active)
		.bind(monitor.interval_secs as i64)
		.bind(monitor.timeout_secs as i64)
		.bind(monitor.max_retries as i64)
		.bind(monitor.retry_interval_secs as i64)
		.bind(monitor.resend_interval as i64)
		.bind(monitor.proxy_id.map(|p| p.0.to_string()))
		.bind(&monitor.push_token)
		.bind(config)
		.bind(monitor.created_at.to_rfc3339())
		.bind(monitor.updated_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self), fields(monitor_id = %id))]
	async fn get_by_id(&self, id: MonitorId) -> Result<Option<Monitor>> {
		let row = sqlx::query_as::<_, MonitorRow>(&format!(
			"SELECT {MONITOR_COLUMNS} FROM monitors WHERE id = ?"
		))
		.bind(id.0.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self, token))]
	async fn get_by_push_token(&self, token: &str) -> Result<Option<Monitor>> {
		let row = sqlx::query_as::<_, MonitorRow>(&format!(
			"SELECT {MONITOR_COLUMNS} FROM monitors WHERE push_token = ?"
		))
		.bind(token)
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self))]
	async fn list_active(&self) -> Result<Vec<Monitor>> {
		let rows = sqlx::query_as::<_, MonitorRow>(&format!(
			"SELECT {MONITOR_COLUMNS} FROM monitors WHERE active = 1 ORDER BY name ASC"
		))
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self), fields(proxy_id = %proxy_id))]
	async fn list_by_proxy(&self, proxy_id: ProxyId) -> Result<Vec<Monitor>> {
		let rows = sqlx::query_as::<_, MonitorRow>(&format!(
			"SELECT {MONITOR_COLUMNS} FROM monitors WHERE proxy_id = ?"
		))
		.bind(proxy_id.0.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self, monitor), fields(monitor_id = %monitor.id))]
	async fn update(&self, monitor: &Monitor) -> Result<()> {
		let config = serde_json::to_string(&monitor.config)?;

		sqlx::query(
			r#"
			UPDATE monitors
			SET name = ?, kind = ?, active = ?,
				interval_secs = ?, timeout_secs = ?, max_retries = ?,
				retry_interval_secs = ?, resend_interval = ?,
				proxy_id = ?, push_token = ?, config = ?,
				updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&monitor.name)
		.bind(&monitor.kind)
		.bind(monitor.active)
		.bind(monitor.interval_secs as i64)
		.bind(monitor.timeout_secs as i64)
		.bind(monitor.max_retries as i64)
		.bind(monitor.retry_interval_secs as i64)
		.bind(monitor.resend_interval as i64)
		.bind(monitor.proxy_id.map(|p| p.0.to_string()))
		.bind(&monitor.push_token)
		.bind(config)
		.bind(Utc::now().to_rfc3339())
		.bind(monitor.id.0.to_string())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self), fields(monitor_id = %id))]
	async fn delete(&self, id: MonitorId) -> Result<bool> {
		let result = sqlx::query("DELETE FROM monitors WHERE id = ?")
			.bind(id.0.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}
}

#[derive(sqlx::FromRow)]
struct MonitorRow {
	id: String,
	name: String,
	kind: String,
	active: bool,
	interval_secs: i64,
	timeout_secs: i64,
	max_retries: i64,
	retry_interval_secs: i64,
	resend_interval: i64,
	proxy_id: Option<String>,
	push_token: Option<String>,
	config: String,
	created_at: String,
	updated_at: String,
}

impl TryFrom<MonitorRow> for Monitor {
	type Error = crate::error::DbError;

	fn try_from(row: MonitorRow) -> Result<Self> {
		Ok(Monitor {
			id: parse_id(&row.id, "monitor id")?,
			name: row.name,
			kind: row.kind,
			active: row.active,
			interval_secs: row.interval_secs as u32,
			timeout_secs: row.timeout_secs as u32,
			max_retries: row.max_retries as u32,
			retry_interval_secs: row.retry_interval_secs as u32,
			resend_interval: row.resend_interval as u32,
			proxy_id: row
				.proxy_id
				.map(|p| parse_id(&p, "proxy id"))
				.transpose()?,
			push_token: row.push_token,
			config: serde_json::from_str(&row.config)?,
			created_at: parse_utc(&row.created_at, "created_at")?,
			updated_at: parse_utc(&row.updated_at, "updated_at")?,
		})
	}
}
