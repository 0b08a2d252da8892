// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Generic webhook provider with optional HMAC-SHA256 payload signing.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use vigil_core::{Heartbeat, Monitor};

use crate::{http_client, Notifier, NotifyError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signature header carried when a secret is configured.
pub const SIGNATURE_HEADER: &str = "X-Vigil-Signature";

/// Per-channel options for the webhook provider.
#[derive(Debug, Clone, Deserialize)]
struct WebhookConfig {
	url: String,

	/// HMAC-SHA256 signing secret for the request body.
	#[serde(default)]
	secret: Option<String>,
}

/// Compute the hex-encoded HMAC-SHA256 signature for a payload.
pub fn compute_signature(secret: &[u8], payload: &[u8]) -> String {
	let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
	mac.update(payload);
	hex::encode(mac.finalize().into_bytes())
}

/// Verify a hex-encoded HMAC-SHA256 signature for a payload.
pub fn verify_signature(secret: &[u8], payload: &[u8], signature: &str) -> bool {
	let expected = match hex::decode(signature) {
		Ok(bytes) => bytes,
		Err(_) => return false,
	};

	let mut mac = match HmacSha256::new_from_slice(secret) {
		Ok(mac) => mac,
		Err(_) => return false,
	};

	mac.update(payload);
	mac.verify_slice(&expected).is_ok()
}

/// JSON POST to an operator-supplied URL.
pub struct WebhookNotifier;

impl WebhookNotifier {
	pub fn new() -> Self {
		Self
	}

	fn parse_config(config: &serde_json::Value) -> Result<WebhookConfig> {
		let config: WebhookConfig = serde_json::from_value(config.clone())
			.map_err(|e| NotifyError::InvalidConfig(e.to_string()))?;

		if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
			return Err(NotifyError::InvalidConfig(format!(
				"url must be http(s): {}",
				config.url
			)));
		}

		Ok(config)
	}
}

impl Default for WebhookNotifier {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Notifier for WebhookNotifier {
	fn kind(&self) -> &'static str {
		"webhook"
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

		let payload = serde_json::json!({
			"event": "monitor.status_changed",
			"msg": message,
			"monitor": {
				"id": monitor.id,
				"name": monitor.name,
				"kind": monitor.kind,
			},
			"heartbeat": heartbeat,
		});
		let body = serde_json::to_vec(&payload)
			.map_err(|e| NotifyError::Send(format!("failed to encode payload: {e}")))?;

		let mut request = http_client()?
			.post(&config.url)
			.header("content-type", "application/json");

		if let Some(secret) = &config.secret {
			let signature = compute_signature(secret.as_bytes(), &body);
			request = request.header(SIGNATURE_HEADER, signature);
		}

		let response = request.body(body).send().await?;
		if !response.status().is_success() {
			return Err(NotifyError::Send(format!(
				"webhook returned {}",
				response.status()
			)));
		}

		Ok(())
	}
}
