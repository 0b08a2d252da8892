// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared test helpers: in-memory pool with the full schema applied.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::str::FromStr;

use crate::schema::ensure_schema;

pub async fn create_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str("sqlite::memory:")
		.unwrap()
		.foreign_keys(true);
	let pool = SqlitePool::connect_with(options).await.unwrap();
	ensure_schema(&pool).await.unwrap();
	pool
}
