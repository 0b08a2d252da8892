// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP(S) probe.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;

use vigil_core::{Monitor, ProbeOutcome, Proxy};

use crate::{Probe, ProbeError, Result};

/// Per-monitor options for the HTTP probe.
#[derive(Debug, Clone, Deserialize)]
struct HttpConfig {
	url: String,

	#[serde(default = "default_method")]
	method: String,

	/// Exact status required; unset accepts any 2xx.
	#[serde(default)]
	expected_status: Option<u16>,

	/// Substring the response body must contain.
	#[serde(default)]
	body_contains: Option<String>,

	#[serde(default)]
	headers: Option<HashMap<String, String>>,

	#[serde(default = "default_true")]
	follow_redirects: bool,

	#[serde(default)]
	basic_auth_user: Option<String>,

	#[serde(default)]
	basic_auth_pass: Option<String>,
}

fn default_method() -> String {
	"GET".to_string()
}

fn default_true() -> bool {
	true
}

/// HTTP(S) endpoint probe.
pub struct HttpProbe;

impl HttpProbe {
	pub fn new() -> Self {
		Self
	}

	fn parse_config(config: &serde_json::Value) -> Result<HttpConfig> {
		let config: HttpConfig = serde_json::from_value(config.clone())
			.map_err(|e| ProbeError::InvalidConfig(e.to_string()))?;

		if config.url.is_empty() {
			return Err(ProbeError::InvalidConfig("url must not be empty".to_string()));
		}
		if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
			return Err(ProbeError::InvalidConfig(format!(
				"url must be http(s): {}",
				config.url
			)));
		}
		match config.method.as_str() {
			"GET" | "HEAD" | "POST" | "PUT" | "DELETE" | "OPTIONS" | "PATCH" => {}
			other => {
				return Err(ProbeError::InvalidConfig(format!(
					"unsupported method: {other}"
				)))
			}
		}

		Ok(config)
	}

	fn build_client(
		config: &HttpConfig,
		monitor: &Monitor,
		proxy: Option<&Proxy>,
	) -> std::result::Result<reqwest::Client, reqwest::Error> {
		let redirect = if config.follow_redirects {
			reqwest::redirect::Policy::limited(10)
		} else {
			reqwest::redirect::Policy::none()
		};

		let mut builder = reqwest::Client::builder()
			.redirect(redirect)
			.timeout(monitor.timeout());

		if let Some(proxy) = proxy.filter(|p| p.active) {
			let mut upstream = reqwest::Proxy::all(proxy.url())?;
			if let (Some(user), Some(pass)) = (&proxy.username, &proxy.password) {
				upstream = upstream.basic_auth(user, pass);
			}
			builder = builder.proxy(upstream);
		}

		builder.build()
	}
}

impl Default for HttpProbe {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Probe for HttpProbe {
	fn kind(&self) -> &'static str {
		"http"
	}

	fn validate(&self, config: &serde_json::Value) -> Result<()> {
		Self::parse_config(config).map(|_| ())
	}

	async fn execute(
		&self,
		monitor: &Monitor,
		proxy: Option<&Proxy>,
	) -> Result<Option<ProbeOutcome>> {
		let started_at = Utc::now();

		let config = match Self::parse_config(&monitor.config) {
			Ok(config) => config,
			Err(e) => return Ok(Some(ProbeOutcome::down(e.to_string(), started_at))),
		};

		let client = match Self::build_client(&config, monitor, proxy) {
			Ok(client) => client,
			Err(e) => {
				return Ok(Some(ProbeOutcome::down(
					format!("failed to build HTTP client: {e}"),
					started_at,
				)))
			}
		};

		let method = reqwest::Method::from_bytes(config.method.as_bytes())
			.unwrap_or(reqwest::Method::GET);
		let mut request = client.request(method, &config.url);

		if let Some(headers) = &config.headers {
			for (name, value) in headers {
				request = request.header(name, value);
			}
		}
		if let Some(user) = &config.basic_auth_user {
			request = request.basic_auth(user, config.basic_auth_pass.as_deref());
		}

		let response = match request.send().await {
			Ok(response) => response,
			Err(e) => {
				let msg = if e.is_timeout() {
					format!("request timed out after {}s", monitor.timeout_secs)
				} else if e.is_connect() {
					format!("connection failed: {e}")
				} else {
					format!("request failed: {e}")
				};
				return Ok(Some(ProbeOutcome::down(msg, started_at)));
			}
		};

		let status = response.status();
		let status_ok = match config.expected_status {
			Some(expected) => status.as_u16() == expected,
			None => status.is_success(),
		};

		if !status_ok {
			return Ok(Some(ProbeOutcome::down(
				match config.expected_status {
					Some(expected) => format!("expected status {expected}, got {status}"),
					None => format!("unexpected status {status}"),
				},
				started_at,
			)));
		}

		if let Some(needle) = &config.body_contains {
			let body = match response.text().await {
				Ok(body) => body,
				Err(e) => {
					return Ok(Some(ProbeOutcome::down(
						format!("failed to read body: {e}"),
						started_at,
					)))
				}
			};
			if !body.contains(needle) {
				return Ok(Some(ProbeOutcome::down(
					format!("body does not contain \"{needle}\""),
					started_at,
				)));
			}
		}

		Ok(Some(ProbeOutcome::up(status.to_string(), started_at)))
	}
}
