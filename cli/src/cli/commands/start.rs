use std::path::PathBuf;

use nanobana_core::config::load_config;
use nanobana_core::proxy::ProxyServer;

pub async fn run(config_path: Option<PathBuf>, port_override: Option<u16>) -> anyhow::Result<()> {
    // Load configuration, then layer FAL_API_KEY / PORT on top
    let mut config = load_config(config_path)?;
    config.apply_env(|key| std::env::var(key).ok())?;

    // Apply port override if provided
    if let Some(port) = port_override {
        config.server.port = port;
    }

    tracing::info!("Starting Nano Banana Proxy...");
    tracing::info!("  Port: {}", config.server.port);
    tracing::info!("  Host: {}", config.server.host);
    tracing::info!("  Generate queue: {}", config.upstream.generate_url);
    tracing::info!("  Edit queue: {}", config.upstream.edit_url);
    tracing::info!("  Storage: {}", config.upstream.storage_url);
    match config.upstream.max_concurrent_requests {
        0 => tracing::info!("  Upstream concurrency: unbounded"),
        n => tracing::info!("  Upstream concurrency: {}", n),
    }

    let server = ProxyServer::new(&config)?;

    tracing::info!("Press Ctrl+C to stop");

    // Run server (blocks until shutdown)
    server.run().await?;

    Ok(())
}
