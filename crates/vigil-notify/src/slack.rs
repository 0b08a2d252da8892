// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Slack incoming-webhook provider.

use async_trait::async_trait;
use serde::Deserialize;

use vigil_core::{Heartbeat, Monitor};

use crate::{http_client, Notifier, NotifyError, Result};

#[derive(Debug, Clone, Deserialize)]
struct SlackConfig {
	webhook_url: String,

	#[serde(default)]
	channel: Option<String>,
}

/// Posts to a Slack incoming webhook.
pub struct SlackNotifier;

impl SlackNotifier {
	pub fn new() -> Self {
		Self
	}

	fn parse_config(config: &serde_json::Value) -> Result<SlackConfig> {
		let config: SlackConfig = serde_json::from_value(config.clone())
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

impl Default for SlackNotifier {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Notifier for SlackNotifier {
	fn kind(&self) -> &'static str {
		"slack"
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

		let mut payload = serde_json::json!({"text": message});
		if let Some(channel) = &config.channel {
			payload["channel"] = serde_json::json!(channel);
		}

		let response = http_client()?
			.post(&config.webhook_url)
			.json(&payload)
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(NotifyError::Send(format!(
				"slack returned {}",
				response.status()
			)));
		}

		Ok(())
	}
}
