use anyhow::Context as _;
use clap::Parser as _;
use std::sync::Arc;
use tokio::net::TcpListener;
use unrelated_mcp_bridge::config::Cli;
use unrelated_mcp_bridge::logging;
use unrelated_mcp_bridge::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format);

    let state = AppState::from_cli(&cli).context("initialize bridge")?;
    let tools: Vec<String> = state
        .dispatcher
        .registry()
        .names()
        .map(str::to_string)
        .collect();
    let validate_input = state.dispatcher.validates_input();

    let addr = cli.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    tracing::info!(port = cli.port, %addr, "MCP bridge started");
    tracing::info!(?tools, validate_input, backend = %cli.mule_base_url, "registered tools");
    tracing::info!(
        "Tool descriptors available at http://localhost:{}/tools",
        cli.port
    );

    axum::serve(listener, server::app(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    tracing::info!("MCP bridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
