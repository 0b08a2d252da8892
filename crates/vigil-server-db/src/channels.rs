// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository for notification channels and their monitor associations.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::instrument;

use vigil_core::{ChannelId, MonitorId, NotificationChannel};

use crate::error::{DbError, Result};
use crate::row::parse_id;

const CHANNEL_COLUMNS: &str = "id, name, kind, active, is_default, config";

/// Repository trait for notification channel operations.
#[async_trait]
pub trait ChannelRepository: Send + Sync {
	async fn create(&self, channel: &NotificationChannel) -> Result<()>;
	async fn get_by_id(&self, id: ChannelId) -> Result<Option<NotificationChannel>>;
	async fn delete(&self, id: ChannelId) -> Result<bool>;

	/// Associate a channel with a monitor.
	async fn attach_monitor(&self, channel_id: ChannelId, monitor_id: MonitorId) -> Result<()>;

	/// Channel ids associated with a monitor.
	async fn channel_ids_for_monitor(&self, monitor_id: MonitorId) -> Result<Vec<ChannelId>>;
}

/// SQLite implementation of the channel repository.
#[derive(Clone)]
pub struct SqliteChannelRepository {
	pool: SqlitePool,
}

impl SqliteChannelRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl ChannelRepository for SqliteChannelRepository {
	#[instrument(skip(self, channel), fields(channel_id = %channel.id, kind = %channel.kind))]
	async fn create(&self, channel: &NotificationChannel) -> Result<()> {
		let config = serde_json::to_string(&channel.config)?;

		sqlx::query(
			"INSERT INTO notification_channels (id, name, kind, active, is_default, config) \
			 VALUES (?, ?, ?, ?, ?, ?)",
		)
		.bind(channel.id.0.to_string())
		.bind(&channel.name)
		.bind(&channel.kind)
		.bind(channel.active)
		.bind(channel.is_default)
		.bind(config)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self), fields(channel_id = %id))]
	async fn get_by_id(&self, id: ChannelId) -> Result<Option<NotificationChannel>> {
		let row = sqlx::query_as::<_, ChannelRow>(&format!(
			"SELECT {CHANNEL_COLUMNS} FROM notification_channels WHERE id = ?"
		))
		.bind(id.0.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self), fields(channel_id = %id))]
	async fn delete(&self, id: ChannelId) -> Result<bool> {
		let result = sqlx::query("DELETE FROM notification_channels WHERE id = ?")
			.bind(id.0.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	#[instrument(skip(self), fields(channel_id = %channel_id, monitor_id = %monitor_id))]
	async fn attach_monitor(&self, channel_id: ChannelId, monitor_id: MonitorId) -> Result<()> {
		sqlx::query(
			"INSERT OR IGNORE INTO monitor_notifications (monitor_id, channel_id) VALUES (?, ?)",
		)
		.bind(monitor_id.0.to_string())
		.bind(channel_id.0.to_string())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self), fields(monitor_id = %monitor_id))]
	async fn channel_ids_for_monitor(&self, monitor_id: MonitorId) -> Result<Vec<ChannelId>> {
		let ids: Vec<(String,)> =
			sqlx::query_as("SELECT channel_id FROM monitor_notifications WHERE monitor_id = ?")
				.bind(monitor_id.0.to_string())
				.fetch_all(&self.pool)
				.await?;

		ids.into_iter()
			.map(|(id,)| parse_id(&id, "channel id"))
			.collect()
	}
}

#[derive(sqlx::FromRow)]
struct ChannelRow {
	id: String,
	name: String,
	kind: String,
	active: bool,
	is_default: bool,
	config: String,
}

impl TryFrom<ChannelRow> for NotificationChannel {
	type Error = DbError;

	fn try_from(row: ChannelRow) -> Result<Self> {
		Ok(NotificationChannel {
			id: parse_id(&row.id, "channel id")?,
			name: row.name,
			kind: row.kind,
			active: row.active,
			is_default: row.is_default,
			config: serde_json::from_str(&row.config)?,
		})
	}
}
