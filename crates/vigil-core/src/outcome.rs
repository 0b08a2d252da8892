// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Transient probe outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::HeartbeatStatus;

/// The transient result of one probe execution, before post-processing.
///
/// The post-processor derives the heartbeat's ping from
/// `finished_at - started_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
	pub status: HeartbeatStatus,
	pub message: String,
	pub started_at: DateTime<Utc>,
	pub finished_at: DateTime<Utc>,
}

impl ProbeOutcome {
	pub fn up(message: impl Into<String>, started_at: DateTime<Utc>) -> Self {
		Self {
			status: HeartbeatStatus::Up,
			message: message.into(),
			started_at,
			finished_at: Utc::now(),
		}
	}

	pub fn down(message: impl Into<String>, started_at: DateTime<Utc>) -> Self {
		Self {
			status: HeartbeatStatus::Down,
			message: message.into(),
			started_at,
			finished_at: Utc::now(),
		}
	}

	/// Synthesized outcome for a monitor inside a maintenance window.
	pub fn maintenance(now: DateTime<Utc>) -> Self {
		Self {
			status: HeartbeatStatus::Maintenance,
			message: "under maintenance".to_string(),
			started_at: now,
			finished_at: now,
		}
	}

	/// Round-trip time in whole milliseconds, clamped at zero.
	pub fn ping_ms(&self) -> i64 {
		(self.finished_at - self.started_at).num_milliseconds().max(0)
	}
}
