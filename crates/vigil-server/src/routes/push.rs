// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Push (dead-man-switch) HTTP handler.
//!
//! External systems call this endpoint instead of being probed; the
//! synthesized outcome runs through the post-processor exactly as an executor
//! result would.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

use vigil_core::{HeartbeatStatus, ProbeOutcome};

use crate::api::AppState;

/// Query parameters for the push endpoint.
#[derive(Debug, Deserialize)]
pub struct PushParams {
	/// Status code: 0=down, 1=up, 2=pending, 3=maintenance. Defaults to up.
	pub status: Option<i64>,
	/// Message to record; defaults to "OK".
	pub msg: Option<String>,
	/// Reported duration in milliseconds.
	pub ping: Option<i64>,
}

/// GET /api/v1/push/{token}
#[instrument(skip(state, params), fields(token = %token))]
pub async fn push(
	State(state): State<AppState>,
	Path(token): Path<String>,
	Query(params): Query<PushParams>,
) -> impl IntoResponse {
	let monitor = match state.monitors.get_by_push_token(&token).await {
		Ok(Some(monitor)) => monitor,
		Ok(None) => {
			return (
				StatusCode::NOT_FOUND,
				Json(serde_json::json!({"ok": false, "message": "unknown push token"})),
			)
				.into_response()
		}
		Err(e) => {
			tracing::error!(error = %e, "failed to look up push token");
			return StatusCode::INTERNAL_SERVER_ERROR.into_response();
		}
	};

	if !monitor.active {
		return (
			StatusCode::BAD_REQUEST,
			Json(serde_json::json!({"ok": false, "message": "monitor is not active"})),
		)
			.into_response();
	}

	let status = match params.status {
		None => HeartbeatStatus::Up,
		Some(code) => match HeartbeatStatus::from_code(code) {
			Some(status) => status,
			None => {
				return (
					StatusCode::BAD_REQUEST,
					Json(serde_json::json!({"ok": false, "message": "invalid status code"})),
				)
					.into_response()
			}
		},
	};

	// Back-date the start by the reported ping so the post-processor's
	// elapsed-time computation reproduces it.
	let ping = params.ping.unwrap_or(0).max(0);
	let now = Utc::now();
	let outcome = ProbeOutcome {
		status,
		message: params.msg.unwrap_or_else(|| "OK".to_string()),
		started_at: now - Duration::milliseconds(ping),
		finished_at: now,
	};

	match state.processor.process(&monitor, &outcome).await {
		Ok(processed) => {
			info!(
				monitor_id = %monitor.id,
				status = %processed.heartbeat.status,
				ping_ms = processed.heartbeat.ping_ms,
				"push heartbeat recorded"
			);
			(StatusCode::OK, Json(serde_json::json!({"ok": true}))).into_response()
		}
		Err(e) => {
			tracing::error!(monitor_id = %monitor.id, error = %e, "failed to process push heartbeat");
			StatusCode::INTERNAL_SERVER_ERROR.into_response()
		}
	}
}
