// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process engine events.
//!
//! Published on the event bus and consumed by the supervisor lifecycle
//! listener, the stats aggregator, the notification dispatcher and the
//! real-time stream.
//!
//! # Events
//!
//! - `monitor.created` / `monitor.updated` / `monitor.deleted` - lifecycle
//! - `proxy.updated` / `proxy.deleted` - restart monitors using the proxy
//! - `heartbeat` - every persisted heartbeat
//! - `monitor.status_changed` - a heartbeat that pages humans

use serde::{Deserialize, Serialize};

use crate::{Heartbeat, Monitor, MonitorId, ProxyId};

/// Discriminant for event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
	MonitorCreated,
	MonitorUpdated,
	MonitorDeleted,
	ProxyUpdated,
	ProxyDeleted,
	Heartbeat,
	StatusChanged,
}

/// A typed engine event with its payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum EngineEvent {
	#[serde(rename = "monitor.created")]
	MonitorCreated(Monitor),

	#[serde(rename = "monitor.updated")]
	MonitorUpdated(Monitor),

	#[serde(rename = "monitor.deleted")]
	MonitorDeleted(MonitorId),

	#[serde(rename = "proxy.updated")]
	ProxyUpdated(ProxyId),

	#[serde(rename = "proxy.deleted")]
	ProxyDeleted(ProxyId),

	/// Every persisted heartbeat.
	#[serde(rename = "heartbeat")]
	Heartbeat(Heartbeat),

	/// A heartbeat whose `notified` flag is set; drives the dispatcher.
	#[serde(rename = "monitor.status_changed")]
	StatusChanged(Heartbeat),
}

impl EngineEvent {
	/// The subscription discriminant for this event.
	pub fn kind(&self) -> EventKind {
		match self {
			Self::MonitorCreated(_) => EventKind::MonitorCreated,
			Self::MonitorUpdated(_) => EventKind::MonitorUpdated,
			Self::MonitorDeleted(_) => EventKind::MonitorDeleted,
			Self::ProxyUpdated(_) => EventKind::ProxyUpdated,
			Self::ProxyDeleted(_) => EventKind::ProxyDeleted,
			Self::Heartbeat(_) => EventKind::Heartbeat,
			Self::StatusChanged(_) => EventKind::StatusChanged,
		}
	}

	/// Returns the event type name as a string.
	pub fn event_type(&self) -> &'static str {
		match self {
			Self::MonitorCreated(_) => "monitor.created",
			Self::MonitorUpdated(_) => "monitor.updated",
			Self::MonitorDeleted(_) => "monitor.deleted",
			Self::ProxyUpdated(_) => "proxy.updated",
			Self::ProxyDeleted(_) => "proxy.deleted",
			Self::Heartbeat(_) => "heartbeat",
			Self::StatusChanged(_) => "monitor.status_changed",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{HeartbeatId, HeartbeatStatus};
	use chrono::Utc;

	fn heartbeat() -> Heartbeat {
		Heartbeat {
			id: HeartbeatId::new(),
			monitor_id: MonitorId::new(),
			status: HeartbeatStatus::Up,
			msg: "200 OK".to_string(),
			ping_ms: 45,
			retries: 0,
			down_count: 0,
			important: true,
			notified: true,
			time: Utc::now(),
			end_time: Utc::now(),
		}
	}

	#[test]
	fn kind_matches_variant() {
		assert_eq!(
			EngineEvent::MonitorDeleted(MonitorId::new()).kind(),
			EventKind::MonitorDeleted
		);
		assert_eq!(EngineEvent::Heartbeat(heartbeat()).kind(), EventKind::Heartbeat);
		assert_eq!(
			EngineEvent::StatusChanged(heartbeat()).kind(),
			EventKind::StatusChanged
		);
	}

	#[test]
	fn heartbeat_event_serialization() {
		let event = EngineEvent::Heartbeat(heartbeat());
		let json = serde_json::to_string(&event).unwrap();
		assert!(json.contains(r#""event":"heartbeat""#));
		assert!(json.contains(r#""ping_ms":45"#));
	}

	#[test]
	fn event_type_names() {
		assert_eq!(
			EngineEvent::StatusChanged(heartbeat()).event_type(),
			"monitor.status_changed"
		);
		assert_eq!(
			EngineEvent::ProxyDeleted(ProxyId::new()).event_type(),
			"proxy.deleted"
		);
	}
}
