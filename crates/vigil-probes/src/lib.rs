// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Probe executors for the Vigil monitoring engine.
//!
//! Each monitor kind maps to one [`Probe`] implementation. Executors are
//! stateless, shared across monitors and ticks, and polymorphic over a small
//! capability set: validate a config bag, execute against a monitor. The
//! supervisor owns scheduling, timeouts and the maintenance short-circuit.

mod dns;
mod http;
mod ping;
mod push;
mod registry;
mod tcp;

pub use dns::DnsProbe;
pub use http::HttpProbe;
pub use ping::PingProbe;
pub use push::PushProbe;
pub use registry::ProbeRegistry;
pub use tcp::TcpProbe;

use async_trait::async_trait;

use vigil_core::{Monitor, ProbeOutcome, Proxy};

/// Errors surfaced by executors.
///
/// These are infrastructure failures, not probe verdicts: a target that is
/// down yields a Down [`ProbeOutcome`], not an error.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
	#[error("invalid config: {0}")]
	InvalidConfig(String),

	#[error("store error: {0}")]
	Store(#[from] vigil_server_db::DbError),
}

pub type Result<T> = std::result::Result<T, ProbeError>;

/// A probe executor for one monitor kind.
///
/// Implementations must not mutate shared state. `execute` returning
/// `Ok(None)` means "skip this tick"; the supervisor treats it as a no-op.
/// At runtime an unusable config produces a Down outcome with a descriptive
/// message instead of an error.
#[async_trait]
pub trait Probe: Send + Sync {
	/// The monitor kind tag this executor serves.
	fn kind(&self) -> &'static str;

	/// Reject malformed config bags. Called by the API layer on
	/// create/update.
	fn validate(&self, config: &serde_json::Value) -> Result<()>;

	/// Run one probe. The supervisor bounds this call with the monitor's
	/// timeout and resolves the proxy, if any, once per task.
	async fn execute(
		&self,
		monitor: &Monitor,
		proxy: Option<&Proxy>,
	) -> Result<Option<ProbeOutcome>>;
}
