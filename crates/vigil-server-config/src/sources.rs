// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults and environment variables.
//!
//! The environment names are the operator-facing contract (`SERVER_PORT`,
//! `DB_TYPE`, `TZ`, ...); `.env` loading happens in main before this runs.

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AuthConfigLayer, DatabaseConfigLayer, EngineConfigLayer, HttpConfigLayer, LoggingConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// Environment variable source.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			database: Some(load_database_from_env()?),
			auth: Some(load_auth_from_env()),
			logging: Some(load_logging_from_env()),
			engine: Some(load_engine_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_u16(name: &str) -> Result<Option<u16>> {
	match env_var(name) {
		Some(value) => value
			.parse()
			.map(Some)
			.map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("not a port number: {value}"),
			}),
		None => Ok(None),
	}
}

fn env_u64(name: &str) -> Result<Option<u64>> {
	match env_var(name) {
		Some(value) => value
			.parse()
			.map(Some)
			.map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("not an integer: {value}"),
			}),
		None => Ok(None),
	}
}

fn env_i64(name: &str) -> Result<Option<i64>> {
	match env_var(name) {
		Some(value) => value
			.parse()
			.map(Some)
			.map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("not an integer: {value}"),
			}),
		None => Ok(None),
	}
}

fn load_http_from_env() -> Result<HttpConfigLayer> {
	Ok(HttpConfigLayer {
		port: env_u16("SERVER_PORT")?,
		client_url: env_var("CLIENT_URL"),
	})
}

fn load_database_from_env() -> Result<DatabaseConfigLayer> {
	Ok(DatabaseConfigLayer {
		db_type: env_var("DB_TYPE"),
		host: env_var("DB_HOST"),
		port: env_u16("DB_PORT")?,
		name: env_var("DB_NAME"),
		user: env_var("DB_USER"),
		pass: env_var("DB_PASS"),
	})
}

fn load_auth_from_env() -> AuthConfigLayer {
	AuthConfigLayer {
		access_secret: env_var("ACCESS_TOKEN_SECRET_KEY"),
		access_expires_in: env_var("ACCESS_TOKEN_EXPIRED_IN"),
		refresh_secret: env_var("REFRESH_TOKEN_SECRET_KEY"),
		refresh_expires_in: env_var("REFRESH_TOKEN_EXPIRED_IN"),
	}
}

fn load_logging_from_env() -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var("LOG_LEVEL"),
		loki_url: env_var("LOKI_URL"),
	}
}

fn load_engine_from_env() -> Result<EngineConfigLayer> {
	Ok(EngineConfigLayer {
		mode: env_var("MODE"),
		timezone: env_var("TZ"),
		max_jitter_secs: env_u64("MAX_JITTER_SECONDS")?,
		keep_data_period_days: env_i64("KEEP_DATA_PERIOD_DAYS")?,
	})
}
