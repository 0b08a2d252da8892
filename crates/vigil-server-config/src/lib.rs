// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration loading for the Vigil server.
//!
//! Sources load partial layers (defaults, then environment), layers merge by
//! precedence, and finalize validates the result. Call after `dotenvy` so
//! `.env` values are visible as environment variables.

mod error;
mod layer;
mod sections;
mod sources;

pub use error::{ConfigError, Result};
pub use layer::ServerConfigLayer;
pub use sections::{
	AuthConfig, DatabaseConfig, EngineConfig, HttpConfig, LoggingConfig, Mode,
	RECOGNIZED_DB_TYPES,
};
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence};

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	/// Absent when no token settings were supplied.
	pub auth: Option<AuthConfig>,
	pub logging: LoggingConfig,
	pub engine: EngineConfig,
}

/// Load configuration from the default source chain.
pub fn load_config() -> Result<Config> {
	load_from_sources(&[&DefaultsSource, &EnvSource])
}

/// Load configuration from an explicit source chain.
pub fn load_from_sources(sources: &[&dyn ConfigSource]) -> Result<Config> {
	let mut sorted: Vec<&&dyn ConfigSource> = sources.iter().collect();
	sorted.sort_by_key(|source| source.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sorted {
		let layer = source.load()?;
		tracing::debug!(source = source.name(), "merged config source");
		merged.merge(layer);
	}

	Ok(Config {
		http: merged.http.unwrap_or_default().finalize(),
		database: merged.database.unwrap_or_default().finalize()?,
		auth: merged.auth.unwrap_or_default().finalize()?,
		logging: merged.logging.unwrap_or_default().finalize(),
		engine: merged.engine.unwrap_or_default().finalize()?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sections::{DatabaseConfigLayer, HttpConfigLayer};

	struct StaticSource {
		precedence: Precedence,
		layer: ServerConfigLayer,
	}

	impl ConfigSource for StaticSource {
		fn name(&self) -> &'static str {
			"static"
		}

		fn precedence(&self) -> Precedence {
			self.precedence
		}

		fn load(&self) -> Result<ServerConfigLayer> {
			Ok(self.layer.clone())
		}
	}

	#[test]
	fn defaults_alone_resolve() {
		let config = load_from_sources(&[&DefaultsSource]).unwrap();
		assert_eq!(config.http.port, 8383);
		assert_eq!(config.database.url, "sqlite:./vigil.db");
		assert!(config.auth.is_none());
		assert_eq!(config.engine.timezone, "UTC");
	}

	#[test]
	fn higher_precedence_wins() {
		let overlay = StaticSource {
			precedence: Precedence::Environment,
			layer: ServerConfigLayer {
				http: Some(HttpConfigLayer {
					port: Some(9999),
					client_url: None,
				}),
				database: Some(DatabaseConfigLayer {
					name: Some("testing".to_string()),
					..Default::default()
				}),
				..Default::default()
			},
		};

		let config = load_from_sources(&[&overlay, &DefaultsSource]).unwrap();
		assert_eq!(config.http.port, 9999);
		assert_eq!(config.database.url, "sqlite:./testing.db");
		// Untouched sections keep defaults.
		assert_eq!(config.http.client_url, "http://localhost:3000");
	}

	#[test]
	fn invalid_section_bubbles_up() {
		let overlay = StaticSource {
			precedence: Precedence::Environment,
			layer: ServerConfigLayer {
				database: Some(DatabaseConfigLayer {
					db_type: Some("mysql".to_string()),
					..Default::default()
				}),
				..Default::default()
			},
		};

		assert!(load_from_sources(&[&overlay, &DefaultsSource]).is_err());
	}
}
