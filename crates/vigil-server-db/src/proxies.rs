// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository for upstream proxies.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::instrument;

use vigil_core::{Proxy, ProxyId};

use crate::error::{DbError, Result};
use crate::row::parse_id;

/// Repository trait for proxy operations.
#[async_trait]
pub trait ProxyRepository: Send + Sync {
	async fn create(&self, proxy: &Proxy) -> Result<()>;
	async fn get_by_id(&self, id: ProxyId) -> Result<Option<Proxy>>;
	async fn delete(&self, id: ProxyId) -> Result<bool>;
}

/// SQLite implementation of the proxy repository.
#[derive(Clone)]
pub struct SqliteProxyRepository {
	pool: SqlitePool,
}

impl SqliteProxyRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl ProxyRepository for SqliteProxyRepository {
	#[instrument(skip(self, proxy), fields(proxy_id = %proxy.id))]
	async fn create(&self, proxy: &Proxy) -> Result<()> {
		sqlx::query(
			"INSERT INTO proxies (id, protocol, host, port, username, password, active) \
			 VALUES (?, ?, ?, ?, ?, ?, ?)",
		)
		.bind(proxy.id.0.to_string())
		.bind(proxy.protocol.to_string())
		.bind(&proxy.host)
		.bind(proxy.port as i64)
		.bind(&proxy.username)
		.bind(&proxy.password)
		.bind(proxy.active)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self), fields(proxy_id = %id))]
	async fn get_by_id(&self, id: ProxyId) -> Result<Option<Proxy>> {
		let row = sqlx::query_as::<_, ProxyRow>(
			"SELECT id, protocol, host, port, username, password, active FROM proxies WHERE id = ?",
		)
		.bind(id.0.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self), fields(proxy_id = %id))]
	async fn delete(&self, id: ProxyId) -> Result<bool> {
		let result = sqlx::query("DELETE FROM proxies WHERE id = ?")
			.bind(id.0.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}
}

#[derive(sqlx::FromRow)]
struct ProxyRow {
	id: String,
	protocol: String,
	host: String,
	port: i64,
	username: Option<String>,
	password: Option<String>,
	active: bool,
}

impl TryFrom<ProxyRow> for Proxy {
	type Error = DbError;

	fn try_from(row: ProxyRow) -> Result<Self> {
		Ok(Proxy {
			id: parse_id(&row.id, "proxy id")?,
			protocol: row
				.protocol
				.parse()
				.map_err(|_| DbError::CorruptRow(format!("invalid protocol: {}", row.protocol)))?,
			host: row.host,
			port: row.port as u16,
			username: row.username,
			password: row.password,
			active: row.active,
		})
	}
}
