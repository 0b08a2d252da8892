// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! ICMP ping probe.
//!
//! Raw ICMP sockets need elevated privileges, so this probe shells out to the
//! system `ping` binary and parses its output.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::process::Command;

use vigil_core::{Monitor, ProbeOutcome, Proxy};

use crate::{Probe, ProbeError, Result};

/// Per-monitor options for the ping probe.
#[derive(Debug, Clone, Deserialize)]
struct PingConfig {
	host: String,

	/// Echo requests per probe.
	#[serde(default = "default_count")]
	count: u32,
}

fn default_count() -> u32 {
	1
}

/// ICMP echo probe via the system `ping` binary.
pub struct PingProbe;

impl PingProbe {
	pub fn new() -> Self {
		Self
	}

	fn parse_config(config: &serde_json::Value) -> Result<PingConfig> {
		let config: PingConfig = serde_json::from_value(config.clone())
			.map_err(|e| ProbeError::InvalidConfig(e.to_string()))?;

		if config.host.is_empty() {
			return Err(ProbeError::InvalidConfig("host must not be empty".to_string()));
		}
		if config.count == 0 || config.count > 10 {
			return Err(ProbeError::InvalidConfig(
				"count must be between 1 and 10".to_string(),
			));
		}

		Ok(config)
	}
}

impl Default for PingProbe {
	fn default() -> Self {
		Self::new()
	}
}

/// Extract the round-trip time from a `ping` stdout line like
/// `64 bytes from 1.1.1.1: icmp_seq=1 ttl=57 time=11.9 ms`.
fn parse_rtt_ms(output: &str) -> Option<f64> {
	output
		.lines()
		.find_map(|line| line.split("time=").nth(1))
		.and_then(|rest| rest.split_whitespace().next())
		.and_then(|value| value.parse().ok())
}

#[async_trait]
impl Probe for PingProbe {
	fn kind(&self) -> &'static str {
		"ping"
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

		let output = Command::new("ping")
			.arg("-n")
			.arg("-c")
			.arg(config.count.to_string())
			.arg("-W")
			.arg(monitor.timeout_secs.to_string())
			.arg(&config.host)
			.kill_on_drop(true)
			.output()
			.await;

		let outcome = match output {
			Ok(output) if output.status.success() => {
				let stdout = String::from_utf8_lossy(&output.stdout);
				let msg = match parse_rtt_ms(&stdout) {
					Some(rtt) => format!("reply from {} in {rtt} ms", config.host),
					None => format!("reply from {}", config.host),
				};
				ProbeOutcome::up(msg, started_at)
			}
			Ok(output) => {
				let stderr = String::from_utf8_lossy(&output.stderr);
				let msg = if stderr.trim().is_empty() {
					format!("no reply from {}", config.host)
				} else {
					format!("ping failed: {}", stderr.trim())
				};
				ProbeOutcome::down(msg, started_at)
			}
			Err(e) => ProbeOutcome::down(format!("failed to run ping: {e}"), started_at),
		};

		Ok(Some(outcome))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn validate_rejects_bad_configs() {
		let probe = PingProbe::new();

		assert!(probe.validate(&serde_json::json!({"host": "1.1.1.1"})).is_ok());
		assert!(probe
			.validate(&serde_json::json!({"host": "1.1.1.1", "count": 3}))
			.is_ok());
		assert!(probe.validate(&serde_json::json!({"host": ""})).is_err());
		assert!(probe
			.validate(&serde_json::json!({"host": "1.1.1.1", "count": 0}))
			.is_err());
		assert!(probe
			.validate(&serde_json::json!({"host": "1.1.1.1", "count": 50}))
			.is_err());
	}

	#[test]
	fn rtt_parsing() {
		let stdout = "PING 1.1.1.1 (1.1.1.1) 56(84) bytes of data.\n\
			64 bytes from 1.1.1.1: icmp_seq=1 ttl=57 time=11.9 ms\n\
			\n--- 1.1.1.1 ping statistics ---\n";
		assert_eq!(parse_rtt_ms(stdout), Some(11.9));

		assert_eq!(parse_rtt_ms("garbage"), None);
	}
}
