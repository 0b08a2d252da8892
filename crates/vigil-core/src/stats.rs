// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Statistics roll-up types.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::MonitorId;

/// Time period for statistics aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatPeriod {
	Minute,
	Hour,
	Day,
}

impl StatPeriod {
	pub const ALL: [StatPeriod; 3] = [StatPeriod::Minute, StatPeriod::Hour, StatPeriod::Day];

	/// Bucket width in seconds.
	pub fn bucket_secs(&self) -> i64 {
		match self {
			Self::Minute => 60,
			Self::Hour => 3_600,
			Self::Day => 86_400,
		}
	}

	/// Truncate a timestamp to the start of its bucket.
	pub fn truncate(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
		let secs = self.bucket_secs();
		let floored = ts.timestamp().div_euclid(secs) * secs;
		Utc.timestamp_opt(floored, 0).single().unwrap_or(ts)
	}
}

impl fmt::Display for StatPeriod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Minute => write!(f, "minute"),
			Self::Hour => write!(f, "hour"),
			Self::Day => write!(f, "day"),
		}
	}
}

impl FromStr for StatPeriod {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"minute" => Ok(Self::Minute),
			"hour" => Ok(Self::Hour),
			"day" => Ok(Self::Day),
			_ => Err(format!("unknown stat period: {}", s)),
		}
	}
}

/// One roll-up row: per monitor, per period, per bucket start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatBucket {
	pub monitor_id: MonitorId,
	pub period: StatPeriod,
	/// Bucket start, truncated to the period.
	pub timestamp: DateTime<Utc>,

	pub ping_avg: f64,
	/// Smallest non-zero ping observed; 0 when no Up beat landed here.
	pub ping_min: i64,
	pub ping_max: i64,

	pub up: i64,
	pub down: i64,
	/// Raw Maintenance beats (these also count toward `up`).
	pub maintenance: i64,
}

impl StatBucket {
	/// An empty bucket for a monitor at a given start.
	pub fn zero(monitor_id: MonitorId, period: StatPeriod, timestamp: DateTime<Utc>) -> Self {
		Self {
			monitor_id,
			period,
			timestamp,
			ping_avg: 0.0,
			ping_min: 0,
			ping_max: 0,
			up: 0,
			down: 0,
			maintenance: 0,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.up == 0 && self.down == 0 && self.maintenance == 0
	}
}

/// Aggregate summary over a range of buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSummary {
	pub ping_avg: f64,
	pub ping_min: i64,
	pub ping_max: i64,
	/// up / (up + down + maintenance), as a percentage.
	pub uptime: f64,
	pub maintenance_pct: f64,
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn period_string_roundtrip(period in prop_oneof![
			Just(StatPeriod::Minute),
			Just(StatPeriod::Hour),
			Just(StatPeriod::Day),
		]) {
			let s = period.to_string();
			let parsed: StatPeriod = s.parse().unwrap();
			prop_assert_eq!(period, parsed);
		}

		#[test]
		fn truncate_is_idempotent(secs in 0i64..4_102_444_800, period in prop_oneof![
			Just(StatPeriod::Minute),
			Just(StatPeriod::Hour),
			Just(StatPeriod::Day),
		]) {
			let ts = Utc.timestamp_opt(secs, 0).unwrap();
			let once = period.truncate(ts);
			prop_assert_eq!(period.truncate(once), once);
			prop_assert!(once <= ts);
			prop_assert!(ts - once < chrono::Duration::seconds(period.bucket_secs()));
		}
	}

	#[test]
	fn truncate_to_bucket_starts() {
		let ts = Utc.with_ymd_and_hms(2025, 1, 15, 2, 17, 43).unwrap();

		assert_eq!(
			StatPeriod::Minute.truncate(ts),
			Utc.with_ymd_and_hms(2025, 1, 15, 2, 17, 0).unwrap()
		);
		assert_eq!(
			StatPeriod::Hour.truncate(ts),
			Utc.with_ymd_and_hms(2025, 1, 15, 2, 0, 0).unwrap()
		);
		assert_eq!(
			StatPeriod::Day.truncate(ts),
			Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap()
		);
	}

	#[test]
	fn zero_bucket_is_empty() {
		let bucket = StatBucket::zero(MonitorId::new(), StatPeriod::Hour, Utc::now());
		assert!(bucket.is_empty());
		assert_eq!(bucket.ping_avg, 0.0);
	}
}
