// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification dispatch.
//!
//! Subscribes to status-change events and fans out to the monitor's
//! configured channels. Every channel is attempted; per-channel failures are
//! logged and never abort the remaining sends.

use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use vigil_core::{EngineEvent, EventKind, Heartbeat};
use vigil_notify::{render_message, ProviderRegistry};
use vigil_server_db::{ChannelRepository, MonitorRepository};

use crate::bus::EventBus;

/// Fans status changes out to notification channels.
pub struct NotificationDispatcher {
	monitors: Arc<dyn MonitorRepository>,
	channels: Arc<dyn ChannelRepository>,
	providers: Arc<ProviderRegistry>,
}

impl NotificationDispatcher {
	pub fn new(
		monitors: Arc<dyn MonitorRepository>,
		channels: Arc<dyn ChannelRepository>,
		providers: Arc<ProviderRegistry>,
	) -> Self {
		Self {
			monitors,
			channels,
			providers,
		}
	}

	/// Subscribe to status-change events on the bus.
	pub async fn attach(self: &Arc<Self>, bus: &EventBus) {
		let dispatcher = Arc::clone(self);
		bus.subscribe(EventKind::StatusChanged, move |event| {
			let dispatcher = Arc::clone(&dispatcher);
			async move {
				if let EngineEvent::StatusChanged(heartbeat) = event {
					dispatcher.dispatch(&heartbeat).await;
				}
			}
		})
		.await;
	}

	/// Deliver one status change to every active channel of its monitor.
	#[instrument(skip(self, heartbeat), fields(monitor_id = %heartbeat.monitor_id, status = %heartbeat.status))]
	pub async fn dispatch(&self, heartbeat: &Heartbeat) {
		let monitor = match self.monitors.get_by_id(heartbeat.monitor_id).await {
			Ok(Some(monitor)) => monitor,
			Ok(None) => {
				// Deleted between the beat and the dispatch; nothing to page.
				debug!("monitor gone, skipping dispatch");
				return;
			}
			Err(e) => {
				error!(error = %e, "failed to load monitor for dispatch");
				return;
			}
		};

		let channel_ids = match self.channels.channel_ids_for_monitor(monitor.id).await {
			Ok(ids) => ids,
			Err(e) => {
				error!(error = %e, "failed to load channels for dispatch");
				return;
			}
		};

		let message = render_message(&monitor, heartbeat);

		for channel_id in channel_ids {
			let channel = match self.channels.get_by_id(channel_id).await {
				Ok(Some(channel)) => channel,
				Ok(None) => continue,
				Err(e) => {
					warn!(channel_id = %channel_id, error = %e, "failed to resolve channel");
					continue;
				}
			};
			if !channel.active {
				continue;
			}

			let Some(provider) = self.providers.get(&channel.kind) else {
				warn!(channel_id = %channel.id, kind = %channel.kind, "no provider for channel kind");
				continue;
			};

			if let Err(e) = provider.validate(&channel.config) {
				warn!(channel = %channel.name, error = %e, "channel config invalid, skipping");
				continue;
			}

			match provider
				.send(&channel.config, &message, &monitor, heartbeat)
				.await
			{
				Ok(()) => {
					info!(channel = %channel.name, kind = %channel.kind, "notification sent");
				}
				Err(e) => {
					warn!(channel = %channel.name, kind = %channel.kind, error = %e, "notification failed");
				}
			}
		}
	}
}
