// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Maintenance window types.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaintenanceId(pub Uuid);

impl MaintenanceId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for MaintenanceId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for MaintenanceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for MaintenanceId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// Schedule configuration for a maintenance window.
///
/// Wall-clock fields are interpreted in the maintenance's timezone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum MaintenanceSchedule {
	/// Operator-entered one-off window.
	Manual {
		start_datetime: NaiveDateTime,
		end_datetime: NaiveDateTime,
	},
	/// One-off window.
	Single {
		start_datetime: NaiveDateTime,
		end_datetime: NaiveDateTime,
	},
	/// Window opens at every cron fire and stays open for `duration_minutes`.
	Cron {
		expression: String,
		duration_minutes: u32,
	},
	/// Every `interval_day` days counted from `start_date`, between
	/// `start_time` and `end_time`.
	RecurringInterval {
		interval_day: u32,
		start_date: NaiveDate,
		start_time: NaiveTime,
		end_time: NaiveTime,
	},
	/// On the listed weekdays (0 = Sunday .. 6 = Saturday), between
	/// `start_time` and `end_time`.
	RecurringWeekday {
		weekdays: Vec<u8>,
		start_time: NaiveTime,
		end_time: NaiveTime,
	},
	/// On the listed days of the month (1..31), between `start_time` and
	/// `end_time`.
	RecurringDayOfMonth {
		days_of_month: Vec<u8>,
		start_time: NaiveTime,
		end_time: NaiveTime,
	},
}

impl MaintenanceSchedule {
	/// Get the strategy tag as a string.
	pub fn strategy(&self) -> &'static str {
		match self {
			Self::Manual { .. } => "manual",
			Self::Single { .. } => "single",
			Self::Cron { .. } => "cron",
			Self::RecurringInterval { .. } => "recurring-interval",
			Self::RecurringWeekday { .. } => "recurring-weekday",
			Self::RecurringDayOfMonth { .. } => "recurring-day-of-month",
		}
	}
}

/// A scheduled maintenance window, associated with monitors via a
/// many-to-many mapping.
///
/// `timezone` is an IANA name; empty means UTC and `SAME_AS_SERVER` means
/// host local time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maintenance {
	pub id: MaintenanceId,
	pub title: String,
	pub active: bool,
	pub timezone: String,
	pub schedule: MaintenanceSchedule,
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn maintenance_id_roundtrip(uuid_bytes in any::<[u8; 16]>()) {
			let uuid = Uuid::from_bytes(uuid_bytes);
			let id = MaintenanceId(uuid);
			let s = id.to_string();
			let parsed: MaintenanceId = s.parse().unwrap();
			prop_assert_eq!(id, parsed);
		}
	}

	#[test]
	fn strategy_tags() {
		let schedule = MaintenanceSchedule::Cron {
			expression: "0 2 * * *".to_string(),
			duration_minutes: 30,
		};
		assert_eq!(schedule.strategy(), "cron");

		let schedule = MaintenanceSchedule::RecurringWeekday {
			weekdays: vec![5],
			start_time: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
			end_time: NaiveTime::from_hms_opt(1, 0, 0).unwrap(),
		};
		assert_eq!(schedule.strategy(), "recurring-weekday");
	}

	#[test]
	fn schedule_serde_tag_roundtrip() {
		let schedule = MaintenanceSchedule::RecurringInterval {
			interval_day: 2,
			start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
			start_time: NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
			end_time: NaiveTime::from_hms_opt(4, 0, 0).unwrap(),
		};

		let json = serde_json::to_string(&schedule).unwrap();
		assert!(json.contains(r#""strategy":"recurring-interval""#));

		let parsed: MaintenanceSchedule = serde_json::from_str(&json).unwrap();
		assert_eq!(parsed, schedule);
	}
}
