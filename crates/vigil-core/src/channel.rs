// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification channel types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub Uuid);

impl ChannelId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for ChannelId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for ChannelId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for ChannelId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// A configured notification destination.
///
/// `kind` selects the provider from the registry; `config` is the per-kind
/// options bag owned by that provider (recipient address, webhook URL, bot
/// token, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationChannel {
	pub id: ChannelId,
	pub name: String,
	/// Provider tag: "smtp", "webhook", "slack", "telegram", ...
	pub kind: String,
	pub active: bool,
	/// Attached to newly created monitors by the API layer.
	pub is_default: bool,
	pub config: serde_json::Value,
}
