// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provider registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
	DiscordNotifier, GotifyNotifier, Notifier, NtfyNotifier, PushoverNotifier, SlackNotifier,
	SmtpNotifier, TelegramNotifier, WebhookNotifier,
};

/// Maps channel kind tags to provider instances.
///
/// Built once at startup and injected into the dispatcher; read-only
/// afterwards.
pub struct ProviderRegistry {
	providers: HashMap<&'static str, Arc<dyn Notifier>>,
}

impl ProviderRegistry {
	pub fn new() -> Self {
		Self {
			providers: HashMap::new(),
		}
	}

	/// Registry with the built-in provider set.
	pub fn with_defaults() -> Self {
		let mut registry = Self::new();
		registry.register(Arc::new(SmtpNotifier::new()));
		registry.register(Arc::new(WebhookNotifier::new()));
		registry.register(Arc::new(SlackNotifier::new()));
		registry.register(Arc::new(TelegramNotifier::new()));
		registry.register(Arc::new(DiscordNotifier::new()));
		registry.register(Arc::new(NtfyNotifier::new()));
		registry.register(Arc::new(GotifyNotifier::new()));
		registry.register(Arc::new(PushoverNotifier::new()));
		registry
	}

	/// Register a provider under its kind tag. Later registrations replace
	/// earlier ones.
	pub fn register(&mut self, provider: Arc<dyn Notifier>) {
		self.providers.insert(provider.kind(), provider);
	}

	pub fn get(&self, kind: &str) -> Option<Arc<dyn Notifier>> {
		self.providers.get(kind).cloned()
	}

	pub fn kinds(&self) -> Vec<&'static str> {
		let mut kinds: Vec<_> = self.providers.keys().copied().collect();
		kinds.sort_unstable();
		kinds
	}
}

impl Default for ProviderRegistry {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_cover_builtin_kinds() {
		let registry = ProviderRegistry::with_defaults();

		assert_eq!(
			registry.kinds(),
			vec![
				"discord", "gotify", "ntfy", "pushover", "slack", "smtp", "telegram", "webhook"
			]
		);
		assert!(registry.get("slack").is_some());
		assert!(registry.get("pagerduty").is_none());
	}
}
