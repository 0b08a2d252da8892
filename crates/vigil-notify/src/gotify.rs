// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Gotify provider.

use async_trait::async_trait;
use serde::Deserialize;

use vigil_core::{Heartbeat, Monitor};

use crate::{http_client, Notifier, NotifyError, Result};

#[derive(Debug, Clone, Deserialize)]
struct GotifyConfig {
	server_url: String,
	app_token: String,

	#[serde(default = "default_priority")]
	priority: u8,
}

fn default_priority() -> u8 {
	5
}

/// Posts messages to a Gotify server.
pub struct GotifyNotifier;

impl GotifyNotifier {
	pub fn new() -> Self {
		Self
	}

	fn parse_config(config: &serde_json::Value) -> Result<GotifyConfig> {
		let config: GotifyConfig = serde_json::from_value(config.clone())
			.map_err(|e| NotifyError::InvalidConfig(e.to_string()))?;

		if !config.server_url.starts_with("https://") && !config.server_url.starts_with("http://") {
			return Err(NotifyError::InvalidConfig(
				"server_url must be http(s)".to_string(),
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

impl Default for GotifyNotifier {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Notifier for GotifyNotifier {
	fn kind(&self) -> &'static str {
		"gotify"
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

		let url = format!(
			"{}/message?token={}",
			config.server_url.trim_end_matches('/'),
			config.app_token
		);
		let payload = serde_json::json!({
			"title": format!("Vigil: {}", monitor.name),
			"message": message,
			"priority": config.priority,
		});

		let response = http_client()?.post(&url).json(&payload).send().await?;
		if !response.status().is_success() {
			return Err(NotifyError::Send(format!(
				"gotify returned {}",
				response.status()
			)));
		}

		Ok(())
	}
}
