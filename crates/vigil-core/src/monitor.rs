// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Monitor types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::ProxyId;

/// Unique identifier for a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorId(pub Uuid);

impl MonitorId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for MonitorId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for MonitorId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for MonitorId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// A named, typed, scheduled health probe configuration.
///
/// `kind` selects the probe executor from the registry; `config` is the
/// per-kind options bag owned by that executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor {
	pub id: MonitorId,

	/// Human-readable name: "API gateway".
	pub name: String,
	/// Executor tag: "http", "tcp", "ping", "dns", "push".
	pub kind: String,
	pub active: bool,

	/// Probe cadence in seconds.
	pub interval_secs: u32,
	/// Per-probe deadline in seconds.
	pub timeout_secs: u32,
	/// Down probes tolerated (as Pending) before the monitor goes Down.
	pub max_retries: u32,
	/// Cadence while a monitor is failing, in seconds.
	pub retry_interval_secs: u32,
	/// Consecutive Down beats between reminder notifications; 0 disables.
	pub resend_interval: u32,

	pub proxy_id: Option<ProxyId>,
	/// Token for push monitors; the dead-man-switch endpoint looks it up.
	pub push_token: Option<String>,

	/// Opaque per-kind options, interpreted by the executor.
	pub config: serde_json::Value,

	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Monitor {
	/// Generate a unique push token (UUIDv4).
	pub fn generate_push_token() -> String {
		Uuid::new_v4().to_string()
	}

	/// The tick-loop interval as a std duration.
	pub fn interval(&self) -> std::time::Duration {
		std::time::Duration::from_secs(u64::from(self.interval_secs))
	}

	/// The failing-state interval as a std duration.
	pub fn retry_interval(&self) -> std::time::Duration {
		std::time::Duration::from_secs(u64::from(self.retry_interval_secs))
	}

	/// The probe deadline as a std duration.
	pub fn timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(u64::from(self.timeout_secs))
	}
}
