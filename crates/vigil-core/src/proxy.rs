// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Upstream proxy types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyId(pub Uuid);

impl ProxyId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for ProxyId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for ProxyId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for ProxyId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// Proxy protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
	Http,
	Https,
	Socks4,
	Socks5,
	/// SOCKS5 with hostname resolution on the proxy.
	Socks5h,
}

impl fmt::Display for ProxyProtocol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Http => write!(f, "http"),
			Self::Https => write!(f, "https"),
			Self::Socks4 => write!(f, "socks4"),
			Self::Socks5 => write!(f, "socks5"),
			Self::Socks5h => write!(f, "socks5h"),
		}
	}
}

impl FromStr for ProxyProtocol {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"http" => Ok(Self::Http),
			"https" => Ok(Self::Https),
			"socks4" => Ok(Self::Socks4),
			"socks5" => Ok(Self::Socks5),
			"socks5h" => Ok(Self::Socks5h),
			_ => Err(format!("unknown proxy protocol: {}", s)),
		}
	}
}

/// An upstream proxy honored by executors that carry HTTP traffic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proxy {
	pub id: ProxyId,
	pub protocol: ProxyProtocol,
	pub host: String,
	pub port: u16,
	pub username: Option<String>,
	pub password: Option<String>,
	pub active: bool,
}

impl Proxy {
	/// Proxy URL without credentials, e.g. `socks5://127.0.0.1:1080`.
	pub fn url(&self) -> String {
		format!("{}://{}:{}", self.protocol, self.host, self.port)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn proxy_id_roundtrip(uuid_bytes in any::<[u8; 16]>()) {
			let uuid = Uuid::from_bytes(uuid_bytes);
			let id = ProxyId(uuid);
			let s = id.to_string();
			let parsed: ProxyId = s.parse().unwrap();
			prop_assert_eq!(id, parsed);
		}

		#[test]
		fn protocol_roundtrip(protocol in prop_oneof![
			Just(ProxyProtocol::Http),
			Just(ProxyProtocol::Https),
			Just(ProxyProtocol::Socks4),
			Just(ProxyProtocol::Socks5),
			Just(ProxyProtocol::Socks5h),
		]) {
			let s = protocol.to_string();
			let parsed: ProxyProtocol = s.parse().unwrap();
			prop_assert_eq!(protocol, parsed);
		}
	}

	#[test]
	fn url_format() {
		let proxy = Proxy {
			id: ProxyId::new(),
			protocol: ProxyProtocol::Socks5,
			host: "127.0.0.1".to_string(),
			port: 1080,
			username: None,
			password: None,
			active: true,
		};
		assert_eq!(proxy.url(), "socks5://127.0.0.1:1080");
	}
}
