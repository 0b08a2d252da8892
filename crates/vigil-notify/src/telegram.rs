// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Telegram bot provider.

use async_trait::async_trait;
use serde::Deserialize;

use vigil_core::{Heartbeat, Monitor};

use crate::{http_client, Notifier, NotifyError, Result};

#[derive(Debug, Clone, Deserialize)]
struct TelegramConfig {
	bot_token: String,
	chat_id: String,

	/// Override for self-hosted Bot API servers; used verbatim as the base.
	#[serde(default = "default_api_base")]
	api_base: String,
}

fn default_api_base() -> String {
	"https://api.telegram.org".to_string()
}

/// Sends messages through the Telegram Bot API.
pub struct TelegramNotifier;

impl TelegramNotifier {
	pub fn new() -> Self {
		Self
	}

	fn parse_config(config: &serde_json::Value) -> Result<TelegramConfig> {
		let config: TelegramConfig = serde_json::from_value(config.clone())
			.map_err(|e| NotifyError::InvalidConfig(e.to_string()))?;

		if config.bot_token.is_empty() {
			return Err(NotifyError::InvalidConfig(
				"bot_token must not be empty".to_string(),
			));
		}
		if config.chat_id.is_empty() {
			return Err(NotifyError::InvalidConfig(
				"chat_id must not be empty".to_string(),
			));
		}

		Ok(config)
	}
}

impl Default for TelegramNotifier {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Notifier for TelegramNotifier {
	fn kind(&self) -> &'static str {
		"telegram"
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

		let url = format!(
			"{}/bot{}/sendMessage",
			config.api_base.trim_end_matches('/'),
			config.bot_token
		);
		let payload = serde_json::json!({
			"chat_id": config.chat_id,
			"text": message,
		});

		let response = http_client()?.post(&url).json(&payload).send().await?;
		if !response.status().is_success() {
			return Err(NotifyError::Send(format!(
				"telegram returned {}",
				response.status()
			)));
		}

		Ok(())
	}
}
