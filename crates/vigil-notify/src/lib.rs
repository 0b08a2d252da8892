// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification channel providers for the Vigil monitoring engine.
//!
//! Each channel kind maps to one [`Notifier`] implementation. Providers are
//! stateless and polymorphic over a small capability set: validate a config
//! bag, send a message for a monitor/heartbeat pair. The dispatcher owns
//! channel resolution and per-channel error containment.

mod discord;
mod gotify;
mod ntfy;
mod pushover;
mod registry;
mod slack;
mod smtp;
mod telegram;
mod webhook;

pub use discord::DiscordNotifier;
pub use gotify::GotifyNotifier;
pub use ntfy::NtfyNotifier;
pub use pushover::PushoverNotifier;
pub use registry::ProviderRegistry;
pub use slack::SlackNotifier;
pub use smtp::SmtpNotifier;
pub use telegram::TelegramNotifier;
pub use webhook::WebhookNotifier;

use async_trait::async_trait;
use std::time::Duration;

use vigil_core::{Heartbeat, HeartbeatStatus, Monitor};

/// Errors surfaced by notification providers.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
	#[error("invalid config: {0}")]
	InvalidConfig(String),

	#[error("http error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("send failed: {0}")]
	Send(String),
}

pub type Result<T> = std::result::Result<T, NotifyError>;

/// A notification provider for one channel kind.
#[async_trait]
pub trait Notifier: Send + Sync {
	/// The channel kind tag this provider serves.
	fn kind(&self) -> &'static str;

	/// Reject malformed config bags. Called by the API layer on
	/// create/update and again by the dispatcher before every send.
	fn validate(&self, config: &serde_json::Value) -> Result<()>;

	/// Deliver a message for a heartbeat.
	async fn send(
		&self,
		config: &serde_json::Value,
		message: &str,
		monitor: &Monitor,
		heartbeat: &Heartbeat,
	) -> Result<()>;
}

/// Render the human-readable alert line for a heartbeat.
pub fn render_message(monitor: &Monitor, heartbeat: &Heartbeat) -> String {
	let state = match heartbeat.status {
		HeartbeatStatus::Up => "UP",
		HeartbeatStatus::Down => "DOWN",
		HeartbeatStatus::Pending => "PENDING",
		HeartbeatStatus::Maintenance => "UNDER MAINTENANCE",
	};

	if heartbeat.msg.is_empty() {
		format!("[{}] is {}", monitor.name, state)
	} else {
		format!("[{}] is {}: {}", monitor.name, state, heartbeat.msg)
	}
}

/// Outbound HTTP client shared by the JSON-post providers.
pub(crate) fn http_client() -> Result<reqwest::Client> {
	reqwest::Client::builder()
		.timeout(Duration::from_secs(10))
		.build()
		.map_err(NotifyError::Http)
}
