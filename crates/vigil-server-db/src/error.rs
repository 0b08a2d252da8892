// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("not found: {0}")]
	NotFound(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("corrupt row: {0}")]
	CorruptRow(String),

	#[error("internal: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, DbError>;
