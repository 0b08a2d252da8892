// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP surface for the Vigil monitoring engine.
//!
//! The REST controllers for monitor/channel/maintenance CRUD live in the
//! external API layer; this crate exposes the engine-owned routes: the push
//! endpoint, the heartbeat SSE stream and liveness.

pub mod api;
pub mod broadcaster;
pub mod routes;

pub use api::AppState;
pub use broadcaster::HeartbeatBroadcaster;

use axum::{routing::get, Router};
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};

/// Build the engine's router.
pub fn create_router(state: AppState, client_url: &str) -> Router {
	let cors = match client_url.parse::<axum::http::HeaderValue>() {
		Ok(origin) => CorsLayer::new()
			.allow_origin(origin)
			.allow_methods(Any)
			.allow_headers(Any),
		Err(_) => {
			tracing::warn!(client_url, "client URL is not a valid origin, allowing any");
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any)
		}
	};

	Router::new()
		.route("/healthz", get(routes::health::healthz))
		.route("/api/v1/push/{token}", get(routes::push::push))
		.route("/api/v1/stream", get(routes::stream::stream_heartbeats))
		.layer(TraceLayer::new_for_http())
		.layer(cors)
		.with_state(state)
}
