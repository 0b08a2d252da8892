// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! DNS resolution probe.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

use vigil_core::{Monitor, ProbeOutcome, Proxy};

use crate::{Probe, ProbeError, Result};

const SUPPORTED_RECORD_TYPES: &[&str] = &["A", "AAAA", "CNAME", "MX", "NS", "TXT"];

/// Per-monitor options for the DNS probe.
#[derive(Debug, Clone, Deserialize)]
struct DnsConfig {
	host: String,

	#[serde(default = "default_record_type")]
	record_type: String,

	/// Resolution succeeds only if some record matches this value.
	#[serde(default)]
	expected: Option<String>,
}

fn default_record_type() -> String {
	"A".to_string()
}

/// DNS resolution probe.
pub struct DnsProbe;

impl DnsProbe {
	pub fn new() -> Self {
		Self
	}

	fn parse_config(config: &serde_json::Value) -> Result<DnsConfig> {
		let mut config: DnsConfig = serde_json::from_value(config.clone())
			.map_err(|e| ProbeError::InvalidConfig(e.to_string()))?;

		if config.host.is_empty() {
			return Err(ProbeError::InvalidConfig("host must not be empty".to_string()));
		}
		config.record_type = config.record_type.to_uppercase();
		if !SUPPORTED_RECORD_TYPES.contains(&config.record_type.as_str()) {
			return Err(ProbeError::InvalidConfig(format!(
				"unsupported record type: {}",
				config.record_type
			)));
		}

		Ok(config)
	}
}

impl Default for DnsProbe {
	fn default() -> Self {
		Self::new()
	}
}

async fn lookup(
	resolver: &TokioAsyncResolver,
	host: &str,
	record_type: &str,
) -> std::result::Result<Vec<String>, String> {
	match record_type {
		"A" => {
			let response = resolver.ipv4_lookup(host).await.map_err(|e| e.to_string())?;
			Ok(response.iter().map(|ip| ip.to_string()).collect())
		}
		"AAAA" => {
			let response = resolver.ipv6_lookup(host).await.map_err(|e| e.to_string())?;
			Ok(response.iter().map(|ip| ip.to_string()).collect())
		}
		"MX" => {
			let response = resolver.mx_lookup(host).await.map_err(|e| e.to_string())?;
			Ok(response
				.iter()
				.map(|mx| format!("{} {}", mx.preference(), mx.exchange()))
				.collect())
		}
		"NS" => {
			let response = resolver.ns_lookup(host).await.map_err(|e| e.to_string())?;
			Ok(response.iter().map(|ns| ns.to_string()).collect())
		}
		"TXT" => {
			let response = resolver.txt_lookup(host).await.map_err(|e| e.to_string())?;
			Ok(response.iter().map(|txt| txt.to_string()).collect())
		}
		"CNAME" => {
			let response = resolver
				.lookup(host, trust_dns_resolver::proto::rr::RecordType::CNAME)
				.await
				.map_err(|e| e.to_string())?;
			Ok(response.iter().map(|r| r.to_string()).collect())
		}
		other => Err(format!("unsupported record type: {other}")),
	}
}

/// Case-insensitive match, ignoring the trailing dot on fully-qualified names.
fn record_matches(value: &str, expected: &str) -> bool {
	value
		.to_lowercase()
		.trim_end_matches('.')
		.eq(expected.to_lowercase().trim_end_matches('.'))
}

#[async_trait]
impl Probe for DnsProbe {
	fn kind(&self) -> &'static str {
		"dns"
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

		let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

		let outcome = match lookup(&resolver, &config.host, &config.record_type).await {
			Ok(values) if values.is_empty() => ProbeOutcome::down(
				format!("no {} records for {}", config.record_type, config.host),
				started_at,
			),
			Ok(values) => match &config.expected {
				Some(expected) if !values.iter().any(|v| record_matches(v, expected)) => {
					ProbeOutcome::down(
						format!("expected \"{expected}\", got: {}", values.join(", ")),
						started_at,
					)
				}
				_ => ProbeOutcome::up(
					format!("{} {} = {}", config.record_type, config.host, values.join(", ")),
					started_at,
				),
			},
			Err(e) => ProbeOutcome::down(format!("lookup failed: {e}"), started_at),
		};

		Ok(Some(outcome))
	}
}
