// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository for maintenance windows and their monitor associations.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::instrument;

use vigil_core::{Maintenance, MaintenanceId, MonitorId};

use crate::error::{DbError, Result};
use crate::row::parse_id;

const MAINTENANCE_COLUMNS: &str = "id, title, active, timezone, schedule";

/// Repository trait for maintenance operations.
///
/// Mutated by the external API layer; the engine evaluates read-only.
#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
	async fn create(&self, maintenance: &Maintenance) -> Result<()>;
	async fn get_by_id(&self, id: MaintenanceId) -> Result<Option<Maintenance>>;
	async fn update(&self, maintenance: &Maintenance) -> Result<()>;
	async fn delete(&self, id: MaintenanceId) -> Result<bool>;

	/// Associate a maintenance with a monitor.
	async fn attach_monitor(&self, maintenance_id: MaintenanceId, monitor_id: MonitorId)
		-> Result<()>;

	/// Active maintenances associated with a monitor.
	async fn list_active_for_monitor(&self, monitor_id: MonitorId) -> Result<Vec<Maintenance>>;
}

/// SQLite implementation of the maintenance repository.
#[derive(Clone)]
pub struct SqliteMaintenanceRepository {
	pool: SqlitePool,
}

impl SqliteMaintenanceRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl MaintenanceRepository for SqliteMaintenanceRepository {
	#[instrument(skip(self, maintenance), fields(maintenance_id = %maintenance.id))]
	async fn create(&self, maintenance: &Maintenance) -> Result<()> {
		let schedule = serde_json::to_string(&maintenance.schedule)?;

		sqlx::query(
			"INSERT INTO maintenances (id, title, active, timezone, schedule) VALUES (?, ?, ?, ?, ?)",
		)
		.bind(maintenance.id.0.to_string())
		.bind(&maintenance.title)
		.bind(maintenance.active)
		.bind(&maintenance.timezone)
		.bind(schedule)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self), fields(maintenance_id = %id))]
	async fn get_by_id(&self, id: MaintenanceId) -> Result<Option<Maintenance>> {
		let row = sqlx::query_as::<_, MaintenanceRow>(&format!(
			"SELECT {MAINTENANCE_COLUMNS} FROM maintenances WHERE id = ?"
		))
		.bind(id.0.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self, maintenance), fields(maintenance_id = %maintenance.id))]
	async fn update(&self, maintenance: &Maintenance) -> Result<()> {
		let schedule = serde_json::to_string(&maintenance.schedule)?;

		sqlx::query(
			"UPDATE maintenances SET title = ?, active = ?, timezone = ?, schedule = ? WHERE id = ?",
		)
		.bind(&maintenance.title)
		.bind(maintenance.active)
		.bind(&maintenance.timezone)
		.bind(schedule)
		.bind(maintenance.id.0.to_string())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self), fields(maintenance_id = %id))]
	async fn delete(&self, id: MaintenanceId) -> Result<bool> {
		let result = sqlx::query("DELETE FROM maintenances WHERE id = ?")
			.bind(id.0.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	#[instrument(skip(self), fields(maintenance_id = %maintenance_id, monitor_id = %monitor_id))]
	async fn attach_monitor(
		&self,
		maintenance_id: MaintenanceId,
		monitor_id: MonitorId,
	) -> Result<()> {
		sqlx::query(
			"INSERT OR IGNORE INTO monitor_maintenances (monitor_id, maintenance_id) VALUES (?, ?)",
		)
		.bind(monitor_id.0.to_string())
		.bind(maintenance_id.0.to_string())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self), fields(monitor_id = %monitor_id))]
	async fn list_active_for_monitor(&self, monitor_id: MonitorId) -> Result<Vec<Maintenance>> {
		let rows = sqlx::query_as::<_, MaintenanceRow>(
			r#"
			SELECT m.id, m.title, m.active, m.timezone, m.schedule
			FROM maintenances m
			JOIN monitor_maintenances mm ON mm.maintenance_id = m.id
			WHERE mm.monitor_id = ? AND m.active = 1
			"#,
		)
		.bind(monitor_id.0.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}
}

#[derive(sqlx::FromRow)]
struct MaintenanceRow {
	id: String,
	title: String,
	active: bool,
	timezone: String,
	schedule: String,
}

impl TryFrom<MaintenanceRow> for Maintenance {
	type Error = DbError;

	fn try_from(row: MaintenanceRow) -> Result<Self> {
		Ok(Maintenance {
			id: parse_id(&row.id, "maintenance id")?,
			title: row.title,
			active: row.active,
			timezone: row.timezone,
			schedule: serde_json::from_str(&row.schedule)?,
		})
	}
}
