// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Maintenance window evaluation.
//!
//! Stateless: a window check costs one pass over the monitor's active
//! maintenances, never a walk over history. All wall-clock fields are
//! interpreted in the maintenance's timezone; an empty timezone means UTC and
//! `SAME_AS_SERVER` means host local time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;

use vigil_core::{Maintenance, MaintenanceSchedule, MonitorId};
use vigil_server_db::MaintenanceRepository;

use crate::error::{EngineError, Result};

/// Sentinel timezone meaning "use the host's local time".
pub const SAME_AS_SERVER: &str = "SAME_AS_SERVER";

/// Convert a standard 5-field Unix cron expression to the 7-field format
/// expected by the `cron` crate.
///
/// 5-field format: minute hour day-of-month month day-of-week
/// 7-field format: second minute hour day-of-month month day-of-week year
fn convert_to_cron_crate_format(expression: &str) -> String {
	let field_count = expression.split_whitespace().count();
	if field_count >= 6 {
		expression.to_string()
	} else if field_count == 5 {
		format!("0 {} *", expression)
	} else {
		// Invalid format, return as-is and let the parser error
		expression.to_string()
	}
}

/// Decides whether a monitor is currently inside a maintenance window.
pub struct MaintenanceEvaluator {
	repo: Arc<dyn MaintenanceRepository>,
}

impl MaintenanceEvaluator {
	pub fn new(repo: Arc<dyn MaintenanceRepository>) -> Self {
		Self { repo }
	}

	/// True iff some active maintenance associated with the monitor has a
	/// window containing `now`.
	#[instrument(skip(self), fields(monitor_id = %monitor_id))]
	pub async fn is_under_maintenance(
		&self,
		monitor_id: MonitorId,
		now: DateTime<Utc>,
	) -> Result<bool> {
		for maintenance in self.repo.list_active_for_monitor(monitor_id).await? {
			if is_window_active(&maintenance, now)? {
				return Ok(true);
			}
		}
		Ok(false)
	}
}

/// Evaluate one maintenance's window against `now`.
pub fn is_window_active(maintenance: &Maintenance, now: DateTime<Utc>) -> Result<bool> {
	let tz = maintenance.timezone.trim();
	if tz == SAME_AS_SERVER {
		eval_in_zone(&maintenance.schedule, now.with_timezone(&chrono::Local))
	} else if tz.is_empty() {
		eval_in_zone(&maintenance.schedule, now)
	} else {
		let tz: Tz = tz
			.parse()
			.map_err(|_| EngineError::InvalidTimezone(tz.to_string()))?;
		eval_in_zone(&maintenance.schedule, now.with_timezone(&tz))
	}
}

fn eval_in_zone<Z>(schedule: &MaintenanceSchedule, now: DateTime<Z>) -> Result<bool>
where
	Z: TimeZone,
	Z::Offset: Copy,
{
	let local_now: NaiveDateTime = now.naive_local();

	match schedule {
		MaintenanceSchedule::Manual {
			start_datetime,
			end_datetime,
		}
		| MaintenanceSchedule::Single {
			start_datetime,
			end_datetime,
		} => Ok(*start_datetime <= local_now && local_now < *end_datetime),

		MaintenanceSchedule::Cron {
			expression,
			duration_minutes,
		} => {
			if *duration_minutes == 0 {
				return Ok(false);
			}
			let cron_expr = convert_to_cron_crate_format(expression);
			let schedule = Schedule::from_str(&cron_expr)
				.map_err(|e| EngineError::InvalidCronExpression(e.to_string()))?;

			// The window is [fire, fire + duration); any fire inside the
			// lookback horizon still covers `now`.
			let lookback = now.clone() - Duration::minutes(i64::from(*duration_minutes));
			Ok(schedule
				.after(&lookback)
				.next()
				.is_some_and(|fire| fire <= now))
		}

		MaintenanceSchedule::RecurringInterval {
			interval_day,
			start_date,
			start_time,
			end_time,
		} => {
			if *interval_day == 0 {
				return Ok(false);
			}
			let interval = i64::from(*interval_day);
			let start_date = *start_date;
			let matches = move |date: NaiveDate| {
				let days = date.signed_duration_since(start_date).num_days();
				days >= 0 && days % interval == 0
			};
			Ok(in_daily_window(matches, local_now, *start_time, *end_time))
		}

		MaintenanceSchedule::RecurringWeekday {
			weekdays,
			start_time,
			end_time,
		} => {
			let weekdays = weekdays.clone();
			let matches = move |date: NaiveDate| {
				weekdays.contains(&(date.weekday().num_days_from_sunday() as u8))
			};
			Ok(in_daily_window(matches, local_now, *start_time, *end_time))
		}

		MaintenanceSchedule::RecurringDayOfMonth {
			days_of_month,
			start_time,
			end_time,
		} => {
			let days = days_of_month.clone();
			let matches = move |date: NaiveDate| days.contains(&(date.day() as u8));
			Ok(in_daily_window(matches, local_now, *start_time, *end_time))
		}
	}
}

/// The shared daily-window rule.
///
/// A window with `end < start` crosses midnight: `now` is inside either when
/// today matches and we are past the start, or when yesterday matched and we
/// are still before the end.
fn in_daily_window(
	matches: impl Fn(NaiveDate) -> bool,
	local_now: NaiveDateTime,
	start: NaiveTime,
	end: NaiveTime,
) -> bool {
	let today = local_now.date();
	let time = local_now.time();

	if start <= end {
		matches(today) && start <= time && time < end
	} else {
		(matches(today) && time >= start)
			|| today
				.pred_opt()
				.map(|yesterday| matches(yesterday) && time < end)
				.unwrap_or(false)
	}
}
