use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use common::context::Context;
use common::{logging, signal};
use tokio::signal::unix::SignalKind;
use tokio::{select, time};

mod api;
mod config;
mod credentials;
mod database;
mod global;
mod image_store;
mod lifecycle;
mod notification;
mod sanitize;


#[tokio::main]
async fn main() -> anyhow::Result<()> {
	dotenvy::dotenv().ok();

	let config = config::AppConfig::parse().context("failed to parse config")?;
	logging::init(&config.logging.level, config.logging.mode).context("failed to init logging")?;

	if let Some(file) = &config.config_file {
		tracing::info!(file = %file, "loaded config");
	}

	let db = sqlx::postgres::PgPoolOptions::new()
		.connect(&config.database.uri)
		.await
		.context("failed to connect to database")?;

	sqlx::migrate!("./migrations")
		.run(&db)
		.await
		.context("failed to run migrations")?;

	let (ctx, handler) = Context::new();

	let global = Arc::new(
		global::GlobalState::new(config, ctx, database::Repositories::postgres(db)).context("failed to setup global state")?,
	);

	tracing::info!(name = %global.config.name, "starting");

	let api_future = tokio::spawn(api::run(global.clone()));

	// Listen on both sigint and sigterm and cancel the context when either is received
	let mut signal_handler = signal::SignalHandler::new()
		.with_signal(SignalKind::interrupt())?
		.with_signal(SignalKind::terminate())?;

	select! {
		r = api_future => tracing::error!("api stopped unexpectedly: {:?}", r),
		_ = signal_handler.recv() => tracing::info!("shutting down"),
	}

	// We cannot have a context in scope when we cancel the handler, otherwise it will deadlock.
	drop(global);

	tracing::info!("waiting for tasks to finish");

	select! {
		_ = time::sleep(Duration::from_secs(60)) => tracing::warn!("force shutting down"),
		_ = signal_handler.recv() => tracing::warn!("force shutting down"),
		_ = handler.cancel() => tracing::info!("shutting down"),
	}

	Ok(())
}
