use anyhow::Context;
use clap::Parser;
use log::info;
use rfshot::server::{self, AppState};
use rfshot::ServiceConfig;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServiceConfig::parse();
    let addr = config.bind;

    #[cfg(feature = "cdp")]
    let launcher = rfshot::cdp::CdpLauncher;
    #[cfg(not(feature = "cdp"))]
    compile_error!("rfshot needs a browser backend; enable the `cdp` feature");

    let app = server::router(AppState { config, launcher });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("rfshot listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
