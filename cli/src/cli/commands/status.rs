use std::path::PathBuf;

use nanobana_core::config::{default_config_path, load_config};

pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    config.apply_env(|key| std::env::var(key).ok())?;

    println!("Nano Banana Proxy Status");
    println!("========================");
    println!();
    println!("Configuration:");
    println!("  Config file: {:?}", default_config_path());
    println!("  API key: {}", if config.api_key.is_some() { "configured" } else { "MISSING (set FAL_API_KEY)" });
    println!();
    println!("Server settings:");
    println!("  Host: {}", config.server.host);
    println!("  Port: {}", config.server.port);
    println!("  Body limit: {} MB", config.server.body_limit_mb);
    println!();
    println!("Upstream:");
    println!("  Generate: {}", config.upstream.generate_url);
    println!("  Edit: {}", config.upstream.edit_url);
    println!("  Storage: {}", config.upstream.storage_url);

    // Check if server is reachable. A wildcard bind address is probed on loopback.
    println!();
    let host = match config.server.host.as_str() {
        "0.0.0.0" | "::" => "127.0.0.1",
        other => other,
    };
    let url = format!("http://{}:{}/health", host, config.server.port);
    match reqwest::get(&url).await {
        Ok(resp) if resp.status().is_success() => {
            println!("Server: RUNNING ✓");
        }
        _ => {
            println!("Server: NOT RUNNING");
        }
    }

    Ok(())
}
