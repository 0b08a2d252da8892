// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Vigil uptime monitoring server binary.

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vigil_engine::{
	attach_lifecycle_listener, EventBus, HeartbeatProcessor, JobRunner, MaintenanceEvaluator,
	NotificationDispatcher, RetentionJob, StatsAggregator, Supervisor, RETENTION_INTERVAL,
};
use vigil_notify::ProviderRegistry;
use vigil_probes::ProbeRegistry;
use vigil_server::{create_router, AppState, HeartbeatBroadcaster};
use vigil_server_db::{
	HeartbeatStore, SettingsRepository, SqliteChannelRepository, SqliteHeartbeatStore,
	SqliteMaintenanceRepository, SqliteMonitorRepository, SqliteProxyRepository,
	SqliteSettingsRepository, SqliteStatsStore, KEEP_DATA_PERIOD_DAYS,
};

/// Vigil server - uptime and health monitoring.
#[derive(Parser, Debug)]
#[command(name = "vigil-server", about = "Vigil uptime monitoring server", version)]
struct Args {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let _args = Args::parse();

	// Load .env file if present
	dotenvy::dotenv().ok();

	// Load configuration
	let config = vigil_server_config::load_config()?;

	// Setup tracing
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		port = config.http.port,
		database = %config.database.url,
		mode = %config.engine.mode,
		"starting vigil-server"
	);

	// Token-signing settings are consumed by the external auth layer; load_config
	// has already validated them, so surface the resolved state here.
	match &config.auth {
		Some(auth) => tracing::info!(
			access_expires_secs = auth.access_expires_in.as_secs(),
			refresh_expires_secs = auth.refresh_expires_in.as_secs(),
			"token signing configured"
		),
		None => tracing::warn!("token signing not configured; the API layer cannot issue sessions"),
	}

	// Create database pool and bootstrap the schema
	let pool = vigil_server_db::create_pool(&config.database.url).await?;
	vigil_server_db::ensure_schema(&pool).await?;

	// Repositories
	let monitors = Arc::new(SqliteMonitorRepository::new(pool.clone()));
	let proxies = Arc::new(SqliteProxyRepository::new(pool.clone()));
	let maintenances = Arc::new(SqliteMaintenanceRepository::new(pool.clone()));
	let channels = Arc::new(SqliteChannelRepository::new(pool.clone()));
	let settings = Arc::new(SqliteSettingsRepository::new(pool.clone()));
	let stats_store = Arc::new(SqliteStatsStore::new(pool.clone()));
	let heartbeats: Arc<dyn HeartbeatStore> = Arc::new(SqliteHeartbeatStore::new(pool));

	// Seed the retention setting on first boot so the API layer can edit it.
	if settings.get(KEEP_DATA_PERIOD_DAYS).await?.is_none() {
		settings
			.set(
				KEEP_DATA_PERIOD_DAYS,
				&config.engine.keep_data_period_days.to_string(),
				"int",
			)
			.await?;
	}

	// Engine wiring: bus, registries, state machine, supervisor
	let bus = Arc::new(EventBus::new());
	let probe_registry = Arc::new(ProbeRegistry::with_defaults(Arc::clone(&heartbeats)));
	let provider_registry = Arc::new(ProviderRegistry::with_defaults());

	let processor = Arc::new(HeartbeatProcessor::new(
		Arc::clone(&heartbeats),
		Arc::clone(&bus),
	));
	let maintenance = Arc::new(MaintenanceEvaluator::new(maintenances));
	let supervisor = Arc::new(Supervisor::with_max_jitter(
		probe_registry,
		monitors.clone(),
		proxies,
		Arc::clone(&processor),
		maintenance,
		Duration::from_secs(config.engine.max_jitter_secs),
	));

	// Consumers
	attach_lifecycle_listener(&bus, Arc::clone(&supervisor)).await;

	let aggregator = Arc::new(StatsAggregator::new(stats_store));
	aggregator.attach(&bus).await;

	let dispatcher = Arc::new(NotificationDispatcher::new(
		monitors.clone(),
		channels,
		provider_registry,
	));
	dispatcher.attach(&bus).await;

	let broadcaster = Arc::new(HeartbeatBroadcaster::with_default_capacity());
	broadcaster.attach(&bus).await;

	// Start probing every active monitor
	supervisor.start_all().await?;

	// Background jobs
	let mut runner = JobRunner::new();
	runner.register_periodic(
		Arc::new(RetentionJob::new(Arc::clone(&heartbeats), settings)),
		RETENTION_INTERVAL,
	);
	runner.start().await;

	// HTTP surface
	let state = AppState {
		monitors,
		processor,
		broadcaster,
	};
	let app = create_router(state, &config.http.client_url);

	let addr = format!("0.0.0.0:{}", config.http.port);
	let listener = tokio::net::TcpListener::bind(&addr).await?;
	tracing::info!(addr = %addr, "listening");

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	tracing::info!("shutting down");
	runner.shutdown().await;
	supervisor.shutdown().await;

	Ok(())
}

async fn shutdown_signal() {
	let _ = tokio::signal::ctrl_c().await;
	tracing::info!("received shutdown signal");
}
