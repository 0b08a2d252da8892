// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for engine operations.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur inside the monitoring engine.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("database error: {0}")]
	Db(#[from] vigil_server_db::DbError),

	#[error("probe error: {0}")]
	Probe(#[from] vigil_probes::ProbeError),

	#[error("invalid cron expression: {0}")]
	InvalidCronExpression(String),

	#[error("invalid timezone: {0}")]
	InvalidTimezone(String),

	#[error("internal error: {0}")]
	Internal(String),
}
