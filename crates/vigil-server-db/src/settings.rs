// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Keyed settings store (value + type).

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::instrument;

use crate::error::Result;

/// Setting key for the heartbeat retention window, in days.
pub const KEEP_DATA_PERIOD_DAYS: &str = "KEEP_DATA_PERIOD_DAYS";

/// Typed key/value settings storage.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
	async fn get(&self, key: &str) -> Result<Option<String>>;
	async fn set(&self, key: &str, value: &str, value_type: &str) -> Result<()>;

	/// Integer convenience read; `None` when the key is absent or malformed.
	async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
		Ok(self.get(key).await?.and_then(|v| v.parse().ok()))
	}
}

/// SQLite implementation of the settings repository.
#[derive(Clone)]
pub struct SqliteSettingsRepository {
	pool: SqlitePool,
}

impl SqliteSettingsRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepository {
	#[instrument(skip(self))]
	async fn get(&self, key: &str) -> Result<Option<String>> {
		let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
			.bind(key)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.map(|(value,)| value))
	}

	#[instrument(skip(self, value))]
	async fn set(&self, key: &str, value: &str, value_type: &str) -> Result<()> {
		sqlx::query(
			"INSERT INTO settings (key, value, value_type) VALUES (?, ?, ?) \
			 ON CONFLICT (key) DO UPDATE SET value = excluded.value, value_type = excluded.value_type",
		)
		.bind(key)
		.bind(value)
		.bind(value_type)
		.execute(&self.pool)
		.await?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	#[tokio::test]
	async fn set_then_get() {
		let pool = create_test_pool().await;
		let repo = SqliteSettingsRepository::new(pool);

		assert!(repo.get(KEEP_DATA_PERIOD_DAYS).await.unwrap().is_none());

		repo.set(KEEP_DATA_PERIOD_DAYS, "180", "int").await.unwrap();
		assert_eq!(
			repo.get(KEEP_DATA_PERIOD_DAYS).await.unwrap().as_deref(),
			Some("180")
		);
		assert_eq!(repo.get_i64(KEEP_DATA_PERIOD_DAYS).await.unwrap(), Some(180));

		// Upsert replaces.
		repo.set(KEEP_DATA_PERIOD_DAYS, "365", "int").await.unwrap();
		assert_eq!(repo.get_i64(KEEP_DATA_PERIOD_DAYS).await.unwrap(), Some(365));
	}

	#[tokio::test]
	async fn malformed_int_reads_as_none() {
		let pool = create_test_pool().await;
		let repo = SqliteSettingsRepository::new(pool);

		repo.set(KEEP_DATA_PERIOD_DAYS, "soon", "int").await.unwrap();
		assert_eq!(repo.get_i64(KEEP_DATA_PERIOD_DAYS).await.unwrap(), None);
	}
}
