// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP server configuration.

use serde::Deserialize;

/// HTTP configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct HttpConfig {
	pub port: u16,
	/// Origin allowed by CORS and used in outbound links.
	pub client_url: String,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			port: 8383,
			client_url: "http://localhost:3000".to_string(),
		}
	}
}

/// HTTP configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfigLayer {
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub client_url: Option<String>,
}

impl HttpConfigLayer {
	pub fn merge(&mut self, other: HttpConfigLayer) {
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.client_url.is_some() {
			self.client_url = other.client_url;
		}
	}

	pub fn finalize(self) -> HttpConfig {
		let defaults = HttpConfig::default();
		HttpConfig {
			port: self.port.unwrap_or(defaults.port),
			client_url: self.client_url.unwrap_or(defaults.client_url),
		}
	}
}
