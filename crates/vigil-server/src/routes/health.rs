// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Liveness probe.

use axum::Json;

/// GET /healthz
pub async fn healthz() -> Json<serde_json::Value> {
	Json(serde_json::json!({"status": "ok"}))
}
