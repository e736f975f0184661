mod config;
mod generate;
mod providers;

use crate::config::Config;
use crate::generate::{AppState, GENERATE_ROUTE};
use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Content generation backend for the generateContent tool")]
struct Cli {
    /// Overrides BIND_ADDRESS.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load application configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    let args = Cli::parse();
    let addr = args.bind.unwrap_or(config.bind_address);

    tracing::info!(
        chainopera = config.chainopera.is_some(),
        openai = config.openai.is_some(),
        "providers configured"
    );
    let state = AppState::from_config(&config).context("Failed to build the HTTP client")?;

    // Any origin may call the generator.
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = generate::router(state).layer(cors);

    tracing::info!("Serving {} on {}", GENERATE_ROUTE, addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
