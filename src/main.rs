use std::net::{IpAddr, SocketAddr};

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use buddi::api;
use buddi::bot::Bot;
use buddi::cli;
use buddi::config_error;
use buddi::store::Sweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "buddi=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse args and env vars
    let settings = cli::Cli::parse().into_settings();
    // Socket server listen address setup
    let listen_address: IpAddr = settings.listen_address.parse::<IpAddr>().map_err(|err| {
        config_error!("invalid listen address {}: {}", settings.listen_address, err)
    })?;
    let socket_address = SocketAddr::from((listen_address, settings.listen_port));

    let bot = Bot::from_settings(&settings);
    let sweeper = Sweeper::start(bot.store().clone(), settings.sweep_interval());

    // Build Axum Router
    let api = api::api(bot, settings.test_endpoint)?;

    // Start server
    info!("Starting Buddi on {}", socket_address);
    let listener = tokio::net::TcpListener::bind(socket_address).await?;
    axum::serve(listener, api)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down sweeper");
    sweeper.stop().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(err = %err, "Failed to listen for shutdown signal");
    }
}
