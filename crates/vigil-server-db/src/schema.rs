// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema bootstrap for the engine-owned tables.
//!
//! Idempotent DDL. Tables owned by the external API layer (status pages,
//! tags, users) are not created here.

use sqlx::SqlitePool;

use crate::error::Result;

/// Create the engine's tables and indexes if they do not exist.
#[tracing::instrument(skip(pool))]
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS monitors (
			id TEXT PRIMARY KEY,
			name TEXT NOT NULL,
			kind TEXT NOT NULL,
			active INTEGER NOT NULL DEFAULT 1,
			interval_secs INTEGER NOT NULL,
			timeout_secs INTEGER NOT NULL,
			max_retries INTEGER NOT NULL DEFAULT 0,
			retry_interval_secs INTEGER NOT NULL,
			resend_interval INTEGER NOT NULL DEFAULT 0,
			proxy_id TEXT,
			push_token TEXT UNIQUE,
			config TEXT NOT NULL,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS heartbeats (
			id TEXT PRIMARY KEY,
			monitor_id TEXT NOT NULL REFERENCES monitors(id) ON DELETE CASCADE,
			status INTEGER NOT NULL,
			msg TEXT NOT NULL,
			ping_ms INTEGER NOT NULL DEFAULT 0,
			retries INTEGER NOT NULL DEFAULT 0,
			down_count INTEGER NOT NULL DEFAULT 0,
			important INTEGER NOT NULL DEFAULT 0,
			notified INTEGER NOT NULL DEFAULT 0,
			time TEXT NOT NULL,
			end_time TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_heartbeats_monitor_time ON heartbeats(monitor_id, time DESC)",
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS stats (
			monitor_id TEXT NOT NULL REFERENCES monitors(id) ON DELETE CASCADE,
			period TEXT NOT NULL,
			timestamp TEXT NOT NULL,
			ping_avg REAL NOT NULL DEFAULT 0,
			ping_min INTEGER NOT NULL DEFAULT 0,
			ping_max INTEGER NOT NULL DEFAULT 0,
			up INTEGER NOT NULL DEFAULT 0,
			down INTEGER NOT NULL DEFAULT 0,
			maintenance INTEGER NOT NULL DEFAULT 0,
			PRIMARY KEY (monitor_id, period, timestamp)
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS maintenances (
			id TEXT PRIMARY KEY,
			title TEXT NOT NULL,
			active INTEGER NOT NULL DEFAULT 1,
			timezone TEXT NOT NULL DEFAULT '',
			schedule TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS monitor_maintenances (
			monitor_id TEXT NOT NULL REFERENCES monitors(id) ON DELETE CASCADE,
			maintenance_id TEXT NOT NULL REFERENCES maintenances(id) ON DELETE CASCADE,
			PRIMARY KEY (monitor_id, maintenance_id)
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS notification_channels (
			id TEXT PRIMARY KEY,
			name TEXT NOT NULL,
			kind TEXT NOT NULL,
			active INTEGER NOT NULL DEFAULT 1,
			is_default INTEGER NOT NULL DEFAULT 0,
			config TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS monitor_notifications (
			monitor_id TEXT NOT NULL REFERENCES monitors(id) ON DELETE CASCADE,
			channel_id TEXT NOT NULL REFERENCES notification_channels(id) ON DELETE CASCADE,
			PRIMARY KEY (monitor_id, channel_id)
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS proxies (
			id TEXT PRIMARY KEY,
			protocol TEXT NOT NULL,
			host TEXT NOT NULL,
			port INTEGER NOT NULL,
			username TEXT,
			password TEXT,
			active INTEGER NOT NULL DEFAULT 1
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS settings (
			key TEXT PRIMARY KEY,
			value TEXT NOT NULL,
			value_type TEXT NOT NULL DEFAULT 'string'
		)
		"#,
	)
	.execute(pool)
	.await?;

	tracing::debug!("schema ensured");
	Ok(())
}
