// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database configuration.

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Recognized database types. This build executes against sqlite; the other
/// recognized values are rejected at finalize with a descriptive error.
pub const RECOGNIZED_DB_TYPES: &[&str] =
	&["postgres", "postgresql", "mysql", "sqlite", "mongo", "mongodb"];

/// Database configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: "sqlite:./vigil.db".to_string(),
		}
	}
}

/// Database configuration layer (partial, for merging).
///
/// `host`, `port`, `user` and `pass` are ignored for sqlite.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub db_type: Option<String>,
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub user: Option<String>,
	#[serde(default)]
	pub pass: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.db_type.is_some() {
			self.db_type = other.db_type;
		}
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.name.is_some() {
			self.name = other.name;
		}
		if other.user.is_some() {
			self.user = other.user;
		}
		if other.pass.is_some() {
			self.pass = other.pass;
		}
	}

	pub fn finalize(self) -> Result<DatabaseConfig> {
		let db_type = self.db_type.unwrap_or_else(|| "sqlite".to_string());

		if !RECOGNIZED_DB_TYPES.contains(&db_type.as_str()) {
			return Err(ConfigError::InvalidValue {
				key: "DB_TYPE".to_string(),
				message: format!("unrecognized value: {db_type}"),
			});
		}
		if db_type != "sqlite" {
			return Err(ConfigError::UnsupportedDatabase(db_type));
		}

		let name = self.name.unwrap_or_else(|| "vigil".to_string());
		Ok(DatabaseConfig {
			url: format!("sqlite:./{name}.db"),
		})
	}
}
