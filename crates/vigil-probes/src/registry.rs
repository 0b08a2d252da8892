// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Executor registry.

use std::collections::HashMap;
use std::sync::Arc;

use vigil_server_db::HeartbeatStore;

use crate::{DnsProbe, HttpProbe, PingProbe, Probe, PushProbe, TcpProbe};

/// Maps monitor kind tags to executor instances.
///
/// Built once at startup and injected into the supervisor; read-only
/// afterwards. Monitors with a kind not present here are refused by the
/// supervisor.
pub struct ProbeRegistry {
	probes: HashMap<&'static str, Arc<dyn Probe>>,
}

impl ProbeRegistry {
	pub fn new() -> Self {
		Self {
			probes: HashMap::new(),
		}
	}

	/// Registry with the built-in executor set.
	pub fn with_defaults(heartbeats: Arc<dyn HeartbeatStore>) -> Self {
		let mut registry = Self::new();
		registry.register(Arc::new(HttpProbe::new()));
		registry.register(Arc::new(TcpProbe::new()));
		registry.register(Arc::new(PingProbe::new()));
		registry.register(Arc::new(DnsProbe::new()));
		registry.register(Arc::new(PushProbe::new(heartbeats)));
		registry
	}

	/// Register an executor under its kind tag. Later registrations replace
	/// earlier ones.
	pub fn register(&mut self, probe: Arc<dyn Probe>) {
		self.probes.insert(probe.kind(), probe);
	}

	pub fn get(&self, kind: &str) -> Option<Arc<dyn Probe>> {
		self.probes.get(kind).cloned()
	}

	pub fn kinds(&self) -> Vec<&'static str> {
		let mut kinds: Vec<_> = self.probes.keys().copied().collect();
		kinds.sort_unstable();
		kinds
	}
}

impl Default for ProbeRegistry {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use vigil_server_db::{testing::create_test_pool, SqliteHeartbeatStore};

	#[tokio::test]
	async fn defaults_cover_builtin_kinds() {
		let pool = create_test_pool().await;
		let store = Arc::new(SqliteHeartbeatStore::new(pool));
		let registry = ProbeRegistry::with_defaults(store);

		assert_eq!(registry.kinds(), vec!["dns", "http", "ping", "push", "tcp"]);
		assert!(registry.get("http").is_some());
		assert!(registry.get("snmp").is_none());
	}
}
