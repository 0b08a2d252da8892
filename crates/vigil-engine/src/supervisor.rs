// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-monitor task supervision.
//!
//! One long-running tick loop per active monitor. Each tick dispatches the
//! probe/post-process pipeline on a detached task so a slow probe cannot
//! delay the next tick; the post-processor's per-monitor lock keeps detached
//! pipelines from interleaving destructively.
//!
//! The tick cadence is dynamic: the post-processor returns the next interval
//! (retry cadence while failing) and the dispatch task pushes it into a
//! single-slot channel the tick loop selects on.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use vigil_core::{Monitor, MonitorId, ProbeOutcome, Proxy, ProxyId};
use vigil_probes::{Probe, ProbeRegistry};
use vigil_server_db::{MonitorRepository, ProxyRepository};

use crate::maintenance::MaintenanceEvaluator;
use crate::processor::HeartbeatProcessor;
use crate::Result;

/// Default upper bound for the startup jitter, in seconds.
pub const DEFAULT_MAX_JITTER_SECS: u64 = 20;

struct MonitorTask {
	shutdown_tx: broadcast::Sender<()>,
	handle: JoinHandle<()>,
}

/// Everything one tick-loop task needs, shared with its detached probe tasks.
struct TickContext {
	monitor: Monitor,
	probe: Arc<dyn Probe>,
	proxy: Option<Proxy>,
	processor: Arc<HeartbeatProcessor>,
	maintenance: Arc<MaintenanceEvaluator>,
	interval_tx: mpsc::Sender<Duration>,
}

/// Owns the lifecycle of every monitor's tick loop.
pub struct Supervisor {
	registry: Arc<ProbeRegistry>,
	monitors: Arc<dyn MonitorRepository>,
	proxies: Arc<dyn ProxyRepository>,
	processor: Arc<HeartbeatProcessor>,
	maintenance: Arc<MaintenanceEvaluator>,
	tasks: RwLock<HashMap<MonitorId, MonitorTask>>,
	max_jitter: Duration,
}

impl Supervisor {
	pub fn new(
		registry: Arc<ProbeRegistry>,
		monitors: Arc<dyn MonitorRepository>,
		proxies: Arc<dyn ProxyRepository>,
		processor: Arc<HeartbeatProcessor>,
		maintenance: Arc<MaintenanceEvaluator>,
	) -> Self {
		Self::with_max_jitter(
			registry,
			monitors,
			proxies,
			processor,
			maintenance,
			Duration::from_secs(DEFAULT_MAX_JITTER_SECS),
		)
	}

	pub fn with_max_jitter(
		registry: Arc<ProbeRegistry>,
		monitors: Arc<dyn MonitorRepository>,
		proxies: Arc<dyn ProxyRepository>,
		processor: Arc<HeartbeatProcessor>,
		maintenance: Arc<MaintenanceEvaluator>,
		max_jitter: Duration,
	) -> Self {
		Self {
			registry,
			monitors,
			proxies,
			processor,
			maintenance,
			tasks: RwLock::new(HashMap::new()),
			max_jitter,
		}
	}

	/// Start (or restart) the tick loop for a monitor.
	///
	/// Any existing loop for the monitor is cancelled and awaited first, so
	/// there is never more than one loop per monitor.
	#[instrument(skip(self, monitor), fields(monitor_id = %monitor.id, kind = %monitor.kind))]
	pub async fn start_monitor(&self, monitor: Monitor) {
		self.stop_monitor(monitor.id).await;

		let Some(probe) = self.registry.get(&monitor.kind) else {
			error!(kind = %monitor.kind, "no executor registered for monitor kind, refusing to start");
			return;
		};

		// Resolve the proxy once; it is cached for the life of this task and
		// refreshed by the proxy-update listener restarting us.
		let proxy = match monitor.proxy_id {
			Some(proxy_id) => match self.proxies.get_by_id(proxy_id).await {
				Ok(proxy) => proxy,
				Err(e) => {
					warn!(proxy_id = %proxy_id, error = %e, "failed to resolve proxy, probing without it");
					None
				}
			},
			None => None,
		};

		let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
		let (interval_tx, interval_rx) = mpsc::channel(1);

		let ctx = Arc::new(TickContext {
			monitor: monitor.clone(),
			probe,
			proxy,
			processor: Arc::clone(&self.processor),
			maintenance: Arc::clone(&self.maintenance),
			interval_tx,
		});

		let max_jitter = self.max_jitter;
		let handle = tokio::spawn(run_tick_loop(ctx, shutdown_rx, interval_rx, max_jitter));

		self.tasks
			.write()
			.await
			.insert(monitor.id, MonitorTask { shutdown_tx, handle });

		info!(name = %monitor.name, "monitor started");
	}

	/// Cancel a monitor's tick loop and wait for it to finish.
	#[instrument(skip(self), fields(monitor_id = %monitor_id))]
	pub async fn stop_monitor(&self, monitor_id: MonitorId) {
		let task = self.tasks.write().await.remove(&monitor_id);
		if let Some(task) = task {
			let _ = task.shutdown_tx.send(());
			if task.handle.await.is_err() {
				warn!(monitor_id = %monitor_id, "monitor task ended in a panic");
			}
			self.processor.forget(monitor_id).await;
			info!(monitor_id = %monitor_id, "monitor stopped");
		}
	}

	/// Start tick loops for every active monitor.
	#[instrument(skip(self))]
	pub async fn start_all(&self) -> Result<()> {
		let monitors = self.monitors.list_active().await?;
		let count = monitors.len();
		for monitor in monitors {
			self.start_monitor(monitor).await;
		}
		info!(count, "supervisor started all active monitors");
		Ok(())
	}

	/// Restart every running monitor that references a proxy.
	#[instrument(skip(self), fields(proxy_id = %proxy_id))]
	pub async fn restart_for_proxy(&self, proxy_id: ProxyId) {
		let referencing = match self.monitors.list_by_proxy(proxy_id).await {
			Ok(monitors) => monitors,
			Err(e) => {
				error!(proxy_id = %proxy_id, error = %e, "failed to list monitors for proxy");
				return;
			}
		};

		for monitor in referencing {
			if monitor.active {
				self.start_monitor(monitor).await;
			}
		}
	}

	/// Whether a tick loop currently exists for the monitor.
	pub async fn is_running(&self, monitor_id: MonitorId) -> bool {
		self.tasks.read().await.contains_key(&monitor_id)
	}

	/// Cancel all tasks and await their completion.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		let tasks: Vec<_> = {
			let mut tasks = self.tasks.write().await;
			tasks.drain().collect()
		};

		for (_, task) in &tasks {
			let _ = task.shutdown_tx.send(());
		}
		for (monitor_id, task) in tasks {
			if task.handle.await.is_err() {
				warn!(monitor_id = %monitor_id, "monitor task ended in a panic");
			}
		}

		info!("supervisor shut down");
	}
}

async fn run_tick_loop(
	ctx: Arc<TickContext>,
	mut shutdown_rx: broadcast::Receiver<()>,
	mut interval_rx: mpsc::Receiver<Duration>,
	max_jitter: Duration,
) {
	// Decorrelate probe fleets that start together.
	let jitter_ms = max_jitter.as_millis() as u64;
	if jitter_ms > 0 {
		let jitter = Duration::from_millis(fastrand::u64(0..jitter_ms));
		tokio::select! {
			_ = tokio::time::sleep(jitter) => {}
			_ = shutdown_rx.recv() => return,
		}
	}

	let mut interval = ctx.monitor.interval();
	loop {
		tokio::spawn(dispatch_probe(Arc::clone(&ctx)));

		// Wait out the interval; an interval update restarts the wait with
		// the new cadence instead of dispatching early.
		let mut due = false;
		while !due {
			tokio::select! {
				_ = tokio::time::sleep(interval) => due = true,
				updated = interval_rx.recv() => {
					match updated {
						Some(next) => {
							if next != interval {
								debug!(monitor_id = %ctx.monitor.id, secs = next.as_secs(), "tick interval updated");
								interval = next;
							}
						}
						None => return,
					}
				}
				_ = shutdown_rx.recv() => return,
			}
		}
	}
}

/// One probe + post-process pipeline, run detached from the tick loop.
async fn dispatch_probe(ctx: Arc<TickContext>) {
	let now = Utc::now();

	// The maintenance check runs before the probe so the state machine sees
	// a real Maintenance outcome with normal timing.
	let under_maintenance = match ctx.maintenance.is_under_maintenance(ctx.monitor.id, now).await {
		Ok(under) => under,
		Err(e) => {
			warn!(monitor_id = %ctx.monitor.id, error = %e, "maintenance evaluation failed, probing anyway");
			false
		}
	};

	let outcome = if under_maintenance {
		Some(ProbeOutcome::maintenance(now))
	} else {
		let started_at = Utc::now();
		match tokio::time::timeout(
			ctx.monitor.timeout(),
			ctx.probe.execute(&ctx.monitor, ctx.proxy.as_ref()),
		)
		.await
		{
			Ok(Ok(outcome)) => outcome,
			Ok(Err(e)) => {
				error!(monitor_id = %ctx.monitor.id, error = %e, "probe execution failed");
				None
			}
			Err(_) => Some(ProbeOutcome::down(
				format!("probe timed out after {}s", ctx.monitor.timeout_secs),
				started_at,
			)),
		}
	};

	// A missing outcome means "skip this tick".
	let Some(outcome) = outcome else { return };

	match ctx.processor.process(&ctx.monitor, &outcome).await {
		Ok(processed) => {
			// Single-slot channel: if a newer update is already queued the
			// tick loop will pick that one up instead.
			let _ = ctx.interval_tx.try_send(processed.next_interval);
		}
		Err(e) => {
			error!(monitor_id = %ctx.monitor.id, error = %e, "heartbeat post-processing failed");
		}
	}
}
