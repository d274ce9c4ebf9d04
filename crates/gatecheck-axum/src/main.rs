//! # gatecheck-demo - Binary Entry Point
//!
//! Serves the demo router. Configuration comes from the environment; see
//! [`gatecheck_axum::config`].

use anyhow::Context;
use gatecheck_axum::config::DemoConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = DemoConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "configuration loaded");

    let app = gatecheck_axum::demo::app(&config).context("failed to build router")?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("gatecheck demo listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
