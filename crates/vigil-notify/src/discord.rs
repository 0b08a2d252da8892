// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Discord webhook provider.

use async_trait::async_trait;
use serde::Deserialize;

use vigil_core::{Heartbeat, Monitor};

use crate::{http_client, Notifier, NotifyError, Result};

#[derive(Debug, Clone, Deserialize)]
struct DiscordConfig {
	webhook_url: String,
}

/// Posts to a Discord channel webhook.
pub struct DiscordNotifier;

impl DiscordNotifier {
	pub fn new() -> Self {
		Self
	}

	fn parse_config(config: &serde_json::Value) -> Result<DiscordConfig> {
		let config: DiscordConfig = serde_json::from_value(config.clone())
			.map_err(|e| NotifyError::InvalidConfig(e.to_string()))?;

		if !config.webhook_url.starts_with("https://") && !config.webhook_url.starts_with("http://")
		{
			return Err(NotifyError::InvalidConfig(
				"webhook_url must be http(s)".to_string(),
			));
		}

		Ok(config)
	}
}

impl Default for DiscordNotifier {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Notifier for DiscordNotifier {
	fn kind(&self) -> &'static str {
		"discord"
	}

	fn validate(&self, config: &serde_json::Value) -> Result<()> {
		Self::parse_config(config).map(|_| ())
	}

	async fn send(
		&self,
		config: &serde_json::Value,
		message: &str,
		_monitor: &Monitor,
		_heartbeat: &Heartbeat,
	) -> Result<()> {
		let config = Self::parse_config(config)?;

		let response = http_client()?
			.post(&config.webhook_url)
			.json(&serde_json::json!({"content": message}))
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(NotifyError::Send(format!(
				"discord returned {}",
				response.status()
			)));
		}

		Ok(())
	}
}
