// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Engine configuration.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, Result};

/// Process mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
	Dev,
	Prod,
	Test,
}

impl fmt::Display for Mode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Dev => write!(f, "dev"),
			Self::Prod => write!(f, "prod"),
			Self::Test => write!(f, "test"),
		}
	}
}

impl FromStr for Mode {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"dev" => Ok(Self::Dev),
			"prod" => Ok(Self::Prod),
			"test" => Ok(Self::Test),
			_ => Err(format!("unknown mode: {}", s)),
		}
	}
}

/// Engine configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct EngineConfig {
	pub mode: Mode,
	/// IANA timezone for display purposes; UTC by default.
	pub timezone: String,
	/// Upper bound for the per-monitor startup jitter.
	pub max_jitter_secs: u64,
	/// Seeded into the settings store on first boot.
	pub keep_data_period_days: i64,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			mode: Mode::Dev,
			timezone: "UTC".to_string(),
			max_jitter_secs: 20,
			keep_data_period_days: 365,
		}
	}
}

/// Engine configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfigLayer {
	#[serde(default)]
	pub mode: Option<String>,
	#[serde(default)]
	pub timezone: Option<String>,
	#[serde(default)]
	pub max_jitter_secs: Option<u64>,
	#[serde(default)]
	pub keep_data_period_days: Option<i64>,
}

impl EngineConfigLayer {
	pub fn merge(&mut self, other: EngineConfigLayer) {
		if other.mode.is_some() {
			self.mode = other.mode;
		}
		if other.timezone.is_some() {
			self.timezone = other.timezone;
		}
		if other.max_jitter_secs.is_some() {
			self.max_jitter_secs = other.max_jitter_secs;
		}
		if other.keep_data_period_days.is_some() {
			self.keep_data_period_days = other.keep_data_period_days;
		}
	}

	pub fn finalize(self) -> Result<EngineConfig> {
		let defaults = EngineConfig::default();

		let mode = match self.mode {
			Some(raw) => raw.parse().map_err(|message| ConfigError::InvalidValue {
				key: "MODE".to_string(),
				message,
			})?,
			None => defaults.mode,
		};

		let timezone = self.timezone.unwrap_or(defaults.timezone);
		if timezone.parse::<chrono_tz::Tz>().is_err() {
			return Err(ConfigError::InvalidValue {
				key: "TZ".to_string(),
				message: format!("not an IANA timezone: {timezone}"),
			});
		}

		let keep_data_period_days = self
			.keep_data_period_days
			.unwrap_or(defaults.keep_data_period_days);
		if keep_data_period_days <= 0 {
			return Err(ConfigError::InvalidValue {
				key: "KEEP_DATA_PERIOD_DAYS".to_string(),
				message: "must be positive".to_string(),
			});
		}

		Ok(EngineConfig {
			mode,
			timezone,
			max_jitter_secs: self.max_jitter_secs.unwrap_or(defaults.max_jitter_secs),
			keep_data_period_days,
		})
	}
}
