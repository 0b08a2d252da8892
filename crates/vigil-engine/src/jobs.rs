// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Periodic background jobs.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::Result;

/// A background job the runner executes on a fixed cadence.
#[async_trait]
pub trait Job: Send + Sync {
	fn id(&self) -> &str;
	fn name(&self) -> &str;

	/// Run one iteration; returns a short human-readable outcome.
	async fn run(&self) -> Result<String>;
}

struct RegisteredJob {
	job: Arc<dyn Job>,
	interval: Duration,
}

/// Runs registered jobs on their intervals until shutdown.
pub struct JobRunner {
	jobs: Vec<RegisteredJob>,
	shutdown_tx: broadcast::Sender<()>,
	handles: Mutex<Vec<JoinHandle<()>>>,
}

impl JobRunner {
	pub fn new() -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			jobs: Vec::new(),
			shutdown_tx,
			handles: Mutex::new(Vec::new()),
		}
	}

	pub fn register_periodic(&mut self, job: Arc<dyn Job>, interval: Duration) {
		self.jobs.push(RegisteredJob { job, interval });
	}

	/// Spawn one loop per registered job.
	pub async fn start(&self) {
		let mut handles = self.handles.lock().await;

		for registered in &self.jobs {
			let job = Arc::clone(&registered.job);
			let interval = registered.interval;
			let mut shutdown_rx = self.shutdown_tx.subscribe();
			let job_id = job.id().to_string();

			let handle = tokio::spawn(async move {
				loop {
					tokio::select! {
						_ = tokio::time::sleep(interval) => {
							match job.run().await {
								Ok(outcome) => {
									info!(job_id = %job.id(), outcome = %outcome, "job completed");
								}
								Err(e) => {
									warn!(job_id = %job.id(), error = %e, "job failed");
								}
							}
						}
						_ = shutdown_rx.recv() => {
							info!(job_id = %job_id, "shutting down periodic job");
							break;
						}
					}
				}
			});

			handles.push(handle);
		}

		info!(job_count = handles.len(), "job runner started");
	}

	pub async fn shutdown(&self) {
		let _ = self.shutdown_tx.send(());

		let mut handles = self.handles.lock().await;
		for handle in handles.drain(..) {
			let _ = handle.await;
		}

		info!("job runner shut down");
	}
}

impl Default for JobRunner {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};

	struct TickingJob {
		runs: Arc<AtomicUsize>,
	}

	#[async_trait]
	impl Job for TickingJob {
		fn id(&self) -> &str {
			"ticking-job"
		}

		fn name(&self) -> &str {
			"Ticking Job"
		}

		async fn run(&self) -> Result<String> {
			self.runs.fetch_add(1, Ordering::SeqCst);
			Ok("ticked".to_string())
		}
	}

	#[tokio::test]
	async fn runs_on_interval_until_shutdown() {
		let runs = Arc::new(AtomicUsize::new(0));
		let mut runner = JobRunner::new();
		runner.register_periodic(
			Arc::new(TickingJob { runs: runs.clone() }),
			Duration::from_millis(20),
		);
		runner.start().await;

		tokio::time::timeout(Duration::from_secs(2), async {
			while runs.load(Ordering::SeqCst) < 2 {
				tokio::time::sleep(Duration::from_millis(10)).await;
			}
		})
		.await
		.expect("job did not run");

		runner.shutdown().await;
		let after_shutdown = runs.load(Ordering::SeqCst);
		tokio::time::sleep(Duration::from_millis(80)).await;
		assert_eq!(runs.load(Ordering::SeqCst), after_shutdown);
	}
}
