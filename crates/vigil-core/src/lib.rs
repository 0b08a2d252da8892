// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Vigil uptime monitoring engine.
//!
//! This crate defines the domain model shared by the engine, the persistence
//! layer and the HTTP surface: monitors, heartbeats, probe outcomes, proxies,
//! notification channels, maintenance windows, statistics roll-ups and the
//! in-process event types.

mod channel;
mod event;
mod heartbeat;
mod maintenance;
mod monitor;
mod outcome;
mod proxy;
mod stats;

pub use channel::{ChannelId, NotificationChannel};
pub use event::{EngineEvent, EventKind};
pub use heartbeat::{Heartbeat, HeartbeatId, HeartbeatStatus};
pub use maintenance::{Maintenance, MaintenanceId, MaintenanceSchedule};
pub use monitor::{Monitor, MonitorId};
pub use outcome::ProbeOutcome;
pub use proxy::{Proxy, ProxyId, ProxyProtocol};
pub use stats::{StatBucket, StatPeriod, StatSummary};
