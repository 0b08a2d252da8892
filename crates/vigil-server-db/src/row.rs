// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared row-decoding helpers.

use chrono::{DateTime, Utc};

use crate::error::{DbError, Result};

/// Parse an RFC 3339 column into a UTC timestamp.
pub(crate) fn parse_utc(value: &str, column: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|_| DbError::CorruptRow(format!("invalid {column}: {value}")))
}

/// Parse a uuid-backed id column.
pub(crate) fn parse_id<T>(value: &str, column: &str) -> Result<T>
where
	T: std::str::FromStr,
{
	value
		.parse()
		.map_err(|_| DbError::CorruptRow(format!("invalid {column}: {value}")))
}
