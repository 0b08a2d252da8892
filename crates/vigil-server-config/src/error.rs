// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },

	#[error("unsupported database type: {0} (this build runs against sqlite)")]
	UnsupportedDatabase(String),

	#[error("{0}")]
	Validation(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
