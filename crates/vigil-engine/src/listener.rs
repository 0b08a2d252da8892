// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event-driven supervisor lifecycle.
//!
//! The external API layer mutates monitors and proxies, then publishes the
//! corresponding events; this listener translates them into supervisor
//! actions so the engine never needs direct calls from the API.

use std::sync::Arc;

use vigil_core::{EngineEvent, EventKind};

use crate::bus::EventBus;
use crate::supervisor::Supervisor;

/// Wire the supervisor to monitor/proxy lifecycle events.
pub async fn attach_lifecycle_listener(bus: &EventBus, supervisor: Arc<Supervisor>) {
	{
		let supervisor = Arc::clone(&supervisor);
		bus.subscribe(EventKind::MonitorCreated, move |event| {
			let supervisor = Arc::clone(&supervisor);
			async move {
				if let EngineEvent::MonitorCreated(monitor) = event {
					if monitor.active {
						supervisor.start_monitor(monitor).await;
					}
				}
			}
		})
		.await;
	}

	{
		let supervisor = Arc::clone(&supervisor);
		bus.subscribe(EventKind::MonitorUpdated, move |event| {
			let supervisor = Arc::clone(&supervisor);
			async move {
				if let EngineEvent::MonitorUpdated(monitor) = event {
					if monitor.active {
						supervisor.start_monitor(monitor).await;
					} else {
						supervisor.stop_monitor(monitor.id).await;
					}
				}
			}
		})
		.await;
	}

	{
		let supervisor = Arc::clone(&supervisor);
		bus.subscribe(EventKind::MonitorDeleted, move |event| {
			let supervisor = Arc::clone(&supervisor);
			async move {
				if let EngineEvent::MonitorDeleted(monitor_id) = event {
					supervisor.stop_monitor(monitor_id).await;
				}
			}
		})
		.await;
	}

	for kind in [EventKind::ProxyUpdated, EventKind::ProxyDeleted] {
		let supervisor = Arc::clone(&supervisor);
		bus.subscribe(kind, move |event| {
			let supervisor = Arc::clone(&supervisor);
			async move {
				let proxy_id = match event {
					EngineEvent::ProxyUpdated(proxy_id) => proxy_id,
					EngineEvent::ProxyDeleted(proxy_id) => proxy_id,
					_ => return,
				};
				supervisor.restart_for_proxy(proxy_id).await;
			}
		})
		.await;
	}
}
