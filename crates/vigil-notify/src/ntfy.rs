// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! ntfy.sh publish provider.

use async_trait::async_trait;
use serde::Deserialize;

use vigil_core::{Heartbeat, HeartbeatStatus, Monitor};

use crate::{http_client, Notifier, NotifyError, Result};

#[derive(Debug, Clone, Deserialize)]
struct NtfyConfig {
	topic: String,

	#[serde(default = "default_server")]
	server_url: String,

	/// 1 (min) .. 5 (max); Down alerts default to high.
	#[serde(default)]
	priority: Option<u8>,
}

fn default_server() -> String {
	"https://ntfy.sh".to_string()
}

/// Publishes to an ntfy topic.
pub struct NtfyNotifier;

impl NtfyNotifier {
	pub fn new() -> Self {
		Self
	}

	fn parse_config(config: &serde_json::Value) -> Result<NtfyConfig> {
		let config: NtfyConfig = serde_json::from_value(config.clone())
			.map_err(|e| NotifyError::InvalidConfig(e.to_string()))?;

		if config.topic.is_empty() {
			return Err(NotifyError::InvalidConfig("topic must not be empty".to_string()));
		}
		if let Some(priority) = config.priority {
			if !(1..=5).contains(&priority) {
				return Err(NotifyError::InvalidConfig(
					"priority must be between 1 and 5".to_string(),
				));
			}
		}

		Ok(config)
	}
}

impl Default for NtfyNotifier {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Notifier for NtfyNotifier {
	fn kind(&self) -> &'static str {
		"ntfy"
	}

	fn validate(&self, config: &serde_json::Value) -> Result<()> {
		Self::parse_config(config).map(|_| ())
	}

	async fn send(
		&self,
		config: &serde_json::Value,
		message: &str,
		monitor: &Monitor,
		heartbeat: &Heartbeat,
	) -> Result<()> {
		let config = Self::parse_config(config)?;

		let priority = config.priority.unwrap_or(match heartbeat.status {
			HeartbeatStatus::Down => 4,
			_ => 3,
		});
		let url = format!("{}/{}", config.server_url.trim_end_matches('/'), config.topic);

		let response = http_client()?
			.post(&url)
			.header("Title", format!("Vigil: {}", monitor.name))
			.header("Priority", priority.to_string())
			.body(message.to_string())
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(NotifyError::Send(format!(
				"ntfy returned {}",
				response.status()
			)));
		}

		Ok(())
	}
}
