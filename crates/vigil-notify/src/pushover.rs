// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pushover provider.

use async_trait::async_trait;
use serde::Deserialize;

use vigil_core::{Heartbeat, Monitor};

use crate::{http_client, Notifier, NotifyError, Result};

const MESSAGES_API: &str = "https://api.pushover.net/1/messages.json";

#[derive(Debug, Clone, Deserialize)]
struct PushoverConfig {
	user_key: String,
	app_token: String,

	/// Override for tests; defaults to the public API.
	#[serde(default = "default_api_url")]
	api_url: String,
}

fn default_api_url() -> String {
	MESSAGES_API.to_string()
}

/// Sends through the Pushover message API.
pub struct PushoverNotifier;

impl PushoverNotifier {
	pub fn new() -> Self {
		Self
	}

	fn parse_config(config: &serde_json::Value) -> Result<PushoverConfig> {
		let config: PushoverConfig = serde_json::from_value(config.clone())
			.map_err(|e| NotifyError::InvalidConfig(e.to_string()))?;

		if config.user_key.is_empty() {
			return Err(NotifyError::InvalidConfig(
				"user_key must not be empty".to_string(),
			));
		}
		if config.app_token.is_empty() {
			return Err(NotifyError::InvalidConfig(
				"app_token must not be empty".to_string(),
			));
		}

		Ok(config)
	}
}

impl Default for PushoverNotifier {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Notifier for PushoverNotifier {
	fn kind(&self) -> &'static str {
		"pushover"
	}

	fn validate(&self, config: &serde_json::Value) -> Result<()> {
		Self::parse_config(config).map(|_| ())
	}

	async fn send(
		&self,
		config: &serde_json::Value,
		message: &str,
		monitor: &Monitor,
		_heartbeat: &Heartbeat,
	) -> Result<()> {
		let config = Self::parse_config(config)?;

		let payload = serde_json::json!({
			"token": config.app_token,
			"user": config.user_key,
			"title": format!("Vigil: {}", monitor.name),
			"message": message,
		});

		let response = http_client()?.post(&config.api_url).json(&payload).send().await?;
		if !response.status().is_success() {
			return Err(NotifyError::Send(format!(
				"pushover returned {}",
				response.status()
			)));
		}

		Ok(())
	}
}
