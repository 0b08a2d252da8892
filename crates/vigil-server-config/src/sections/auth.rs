// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Token-signing configuration.
//!
//! Consumed by the external auth layer; the engine only validates it at
//! startup so misconfiguration fails fast instead of at first login.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{ConfigError, Result};

const MIN_SECRET_LEN: usize = 16;
const MIN_EXPIRY: Duration = Duration::from_secs(60);

/// Auth configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct AuthConfig {
	pub access_secret: String,
	pub access_expires_in: Duration,
	pub refresh_secret: String,
	pub refresh_expires_in: Duration,
}

/// Auth configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub access_secret: Option<String>,
	#[serde(default)]
	pub access_expires_in: Option<String>,
	#[serde(default)]
	pub refresh_secret: Option<String>,
	#[serde(default)]
	pub refresh_expires_in: Option<String>,
}

fn parse_expiry(key: &str, value: &str) -> Result<Duration> {
	let duration = humantime::parse_duration(value).map_err(|e| ConfigError::InvalidValue {
		key: key.to_string(),
		message: e.to_string(),
	})?;
	if duration < MIN_EXPIRY {
		return Err(ConfigError::InvalidValue {
			key: key.to_string(),
			message: "must be at least 1m".to_string(),
		});
	}
	Ok(duration)
}

fn check_secret(key: &str, value: &str) -> Result<()> {
	if value.len() < MIN_SECRET_LEN {
		return Err(ConfigError::InvalidValue {
			key: key.to_string(),
			message: format!("must be at least {MIN_SECRET_LEN} characters"),
		});
	}
	Ok(())
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.access_secret.is_some() {
			self.access_secret = other.access_secret;
		}
		if other.access_expires_in.is_some() {
			self.access_expires_in = other.access_expires_in;
		}
		if other.refresh_secret.is_some() {
			self.refresh_secret = other.refresh_secret;
		}
		if other.refresh_expires_in.is_some() {
			self.refresh_expires_in = other.refresh_expires_in;
		}
	}

	/// `None` when no auth settings were supplied at all; an error when they
	/// are partial or invalid.
	pub fn finalize(self) -> Result<Option<AuthConfig>> {
		let supplied = self.access_secret.is_some()
			|| self.refresh_secret.is_some()
			|| self.access_expires_in.is_some()
			|| self.refresh_expires_in.is_some();
		if !supplied {
			return Ok(None);
		}

		let access_secret = self.access_secret.ok_or_else(|| {
			ConfigError::Validation("ACCESS_TOKEN_SECRET_KEY is required".to_string())
		})?;
		let refresh_secret = self.refresh_secret.ok_or_else(|| {
			ConfigError::Validation("REFRESH_TOKEN_SECRET_KEY is required".to_string())
		})?;
		check_secret("ACCESS_TOKEN_SECRET_KEY", &access_secret)?;
		check_secret("REFRESH_TOKEN_SECRET_KEY", &refresh_secret)?;

		let access_expires_in = parse_expiry(
			"ACCESS_TOKEN_EXPIRED_IN",
			self.access_expires_in.as_deref().unwrap_or("15m"),
		)?;
		let refresh_expires_in = parse_expiry(
			"REFRESH_TOKEN_EXPIRED_IN",
			self.refresh_expires_in.as_deref().unwrap_or("7d"),
		)?;

		if access_expires_in >= refresh_expires_in {
			return Err(ConfigError::Validation(
				"ACCESS_TOKEN_EXPIRED_IN must be shorter than REFRESH_TOKEN_EXPIRED_IN".to_string(),
			));
		}

		Ok(Some(AuthConfig {
			access_secret,
			access_expires_in,
			refresh_secret,
			refresh_expires_in,
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn full_layer() -> AuthConfigLayer {
		AuthConfigLayer {
			access_secret: Some("0123456789abcdef".to_string()),
			access_expires_in: Some("15m".to_string()),
			refresh_secret: Some("fedcba9876543210".to_string()),
			refresh_expires_in: Some("7d".to_string()),
		}
	}

	#[test]
	fn absent_settings_mean_no_auth() {
		assert!(AuthConfigLayer::default().finalize().unwrap().is_none());
	}

	#[test]
	fn valid_settings_resolve() {
		let config = full_layer().finalize().unwrap().unwrap();
		assert_eq!(config.access_expires_in, Duration::from_secs(15 * 60));
		assert_eq!(config.refresh_expires_in, Duration::from_secs(7 * 86_400));
	}

	#[test]
	fn short_secret_is_rejected() {
		let mut layer = full_layer();
		layer.access_secret = Some("short".to_string());
		assert!(layer.finalize().is_err());
	}

	#[test]
	fn sub_minute_expiry_is_rejected() {
		let mut layer = full_layer();
		layer.access_expires_in = Some("30s".to_string());
		assert!(layer.finalize().is_err());
	}

	#[test]
	fn access_must_be_shorter_than_refresh() {
		let mut layer = full_layer();
		layer.access_expires_in = Some("8d".to_string());
		assert!(layer.finalize().is_err());
	}

	#[test]
	fn partial_settings_are_rejected() {
		let layer = AuthConfigLayer {
			access_secret: Some("0123456789abcdef".to_string()),
			..Default::default()
		};
		assert!(layer.finalize().is_err());
	}
}
