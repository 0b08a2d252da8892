// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The Vigil monitoring engine.
//!
//! Wires the per-monitor scheduling supervisor, the probe-execution
//! abstraction, the heartbeat post-processing state machine, the maintenance
//! evaluator, the in-process event bus, the statistics aggregator and the
//! notification dispatcher into one engine.
//!
//! Data flow: the supervisor ticks, invokes the executor, hands the outcome
//! to the post-processor, which consults the maintenance evaluator (via the
//! supervisor) and the previous heartbeat, persists the new beat and
//! publishes events; the stats aggregator and the dispatcher react.

mod bus;
mod dispatcher;
mod error;
mod jobs;
mod listener;
mod maintenance;
mod processor;
mod retention;
mod stats;
mod supervisor;

pub use bus::{EventBus, EventHandler};
pub use dispatcher::NotificationDispatcher;
pub use error::{EngineError, Result};
pub use jobs::{Job, JobRunner};
pub use listener::attach_lifecycle_listener;
pub use maintenance::{is_window_active, MaintenanceEvaluator, SAME_AS_SERVER};
pub use processor::{HeartbeatProcessor, Processed};
pub use retention::{RetentionJob, DEFAULT_KEEP_DATA_PERIOD_DAYS, RETENTION_INTERVAL};
pub use stats::StatsAggregator;
pub use supervisor::{Supervisor, DEFAULT_MAX_JITTER_SECS};
