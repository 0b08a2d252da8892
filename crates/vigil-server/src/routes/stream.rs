// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SSE stream of heartbeats.

use std::convert::Infallible;

use axum::{
	extract::State,
	response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, info};

use crate::api::AppState;

/// GET /api/v1/stream - heartbeats for all monitors, in near real time.
pub async fn stream_heartbeats(
	State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
	info!("client connected to heartbeat stream");

	let receiver = state.broadcaster.subscribe();
	let updates = BroadcastStream::new(receiver).filter_map(|result| match result {
		Ok(heartbeat) => match serde_json::to_string(&heartbeat) {
			Ok(json) => Some(Ok::<_, Infallible>(
				Event::default().event("heartbeat").data(json),
			)),
			Err(e) => {
				tracing::warn!(error = %e, "failed to serialize heartbeat for stream");
				None
			}
		},
		Err(e) => {
			debug!(error = %e, "stream client lagged");
			None
		}
	});

	Sse::new(updates).keep_alive(
		KeepAlive::new()
			.interval(std::time::Duration::from_secs(30))
			.text("keep-alive"),
	)
}
