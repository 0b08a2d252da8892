// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! TCP connect probe.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::net::TcpStream;

use vigil_core::{Monitor, ProbeOutcome, Proxy};

use crate::{Probe, ProbeError, Result};

/// Per-monitor options for the TCP probe.
#[derive(Debug, Clone, Deserialize)]
struct TcpConfig {
	host: String,
	port: u16,
}

/// TCP port connectivity probe.
pub struct TcpProbe;

impl TcpProbe {
	pub fn new() -> Self {
		Self
	}

	fn parse_config(config: &serde_json::Value) -> Result<TcpConfig> {
		let config: TcpConfig = serde_json::from_value(config.clone())
			.map_err(|e| ProbeError::InvalidConfig(e.to_string()))?;

		if config.host.is_empty() {
			return Err(ProbeError::InvalidConfig("host must not be empty".to_string()));
		}
		if config.port == 0 {
			return Err(ProbeError::InvalidConfig("port must be non-zero".to_string()));
		}

		Ok(config)
	}
}

impl Default for TcpProbe {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Probe for TcpProbe {
	fn kind(&self) -> &'static str {
		"tcp"
	}

	fn validate(&self, config: &serde_json::Value) -> Result<()> {
		Self::parse_config(config).map(|_| ())
	}

	async fn execute(
		&self,
		monitor: &Monitor,
		_proxy: Option<&Proxy>,
	) -> Result<Option<ProbeOutcome>> {
		let started_at = Utc::now();

		let config = match Self::parse_config(&monitor.config) {
			Ok(config) => config,
			Err(e) => return Ok(Some(ProbeOutcome::down(e.to_string(), started_at))),
		};

		let addr = format!("{}:{}", config.host, config.port);
		let outcome = match TcpStream::connect(&addr).await {
			Ok(_stream) => ProbeOutcome::up(format!("connected to {addr}"), started_at),
			Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
				ProbeOutcome::down(format!("connection refused: {addr}"), started_at)
			}
			Err(e) => ProbeOutcome::down(format!("connect failed: {e}"), started_at),
		};

		Ok(Some(outcome))
	}
}
