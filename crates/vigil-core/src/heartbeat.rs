// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Heartbeat types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::MonitorId;

/// Unique identifier for a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeartbeatId(pub Uuid);

impl HeartbeatId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for HeartbeatId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for HeartbeatId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for HeartbeatId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// Status of a heartbeat.
///
/// The wire/database encoding is the numeric code: Down=0, Up=1, Pending=2,
/// Maintenance=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatStatus {
	Down,
	Up,
	/// A failing probe still inside the retry budget.
	Pending,
	/// The monitor was inside a maintenance window.
	Maintenance,
}

impl HeartbeatStatus {
	/// Numeric code used in the database and the push endpoint.
	pub fn code(&self) -> i64 {
		match self {
			Self::Down => 0,
			Self::Up => 1,
			Self::Pending => 2,
			Self::Maintenance => 3,
		}
	}

	/// Decode a numeric status code.
	pub fn from_code(code: i64) -> Option<Self> {
		match code {
			0 => Some(Self::Down),
			1 => Some(Self::Up),
			2 => Some(Self::Pending),
			3 => Some(Self::Maintenance),
			_ => None,
		}
	}

	/// Flat status mapping for uptime counters: Up and Maintenance count as
	/// up, Down and Pending count as down.
	pub fn is_counted_up(&self) -> bool {
		matches!(self, Self::Up | Self::Maintenance)
	}
}

impl fmt::Display for HeartbeatStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Down => write!(f, "down"),
			Self::Up => write!(f, "up"),
			Self::Pending => write!(f, "pending"),
			Self::Maintenance => write!(f, "maintenance"),
		}
	}
}

impl FromStr for HeartbeatStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"down" => Ok(Self::Down),
			"up" => Ok(Self::Up),
			"pending" => Ok(Self::Pending),
			"maintenance" => Ok(Self::Maintenance),
			_ => Err(format!("unknown heartbeat status: {}", s)),
		}
	}
}

/// The persisted outcome of a single probe (or synthesized equivalent).
///
/// Immutable once written. For a given monitor, heartbeats are totally
/// ordered by `time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
	pub id: HeartbeatId,
	pub monitor_id: MonitorId,

	pub status: HeartbeatStatus,
	pub msg: String,
	pub ping_ms: i64,

	/// Consecutive failing probes, including this one.
	pub retries: u32,
	/// Consecutive non-important Down beats since the last reminder.
	pub down_count: u32,

	/// The status transition that produced this beat is in the important set,
	/// or this is the monitor's first beat.
	pub important: bool,
	/// A status-change event was published for this beat.
	pub notified: bool,

	pub time: DateTime<Utc>,
	pub end_time: DateTime<Utc>,
}
