// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP state.

use std::sync::Arc;

use vigil_engine::HeartbeatProcessor;
use vigil_server_db::MonitorRepository;

use crate::broadcaster::HeartbeatBroadcaster;

/// State shared by the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
	pub monitors: Arc<dyn MonitorRepository>,
	pub processor: Arc<HeartbeatProcessor>,
	pub broadcaster: Arc<HeartbeatBroadcaster>,
}
