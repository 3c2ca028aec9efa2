use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the provider key
pub const API_KEY_ENV: &str = "FAL_API_KEY";
/// Environment variable overriding the listen port
pub const PORT_ENV: &str = "PORT";

/// Proxy server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    /// Only ever populated from the environment.
    #[serde(skip)]
    pub api_key: Option<ApiKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Inbound body cap in megabytes, shared by JSON and multipart routes
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            body_limit_mb: default_body_limit_mb(),
        }
    }
}

impl ServerConfig {
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_generate_url")]
    pub generate_url: String,

    #[serde(default = "default_edit_url")]
    pub edit_url: String,

    #[serde(default = "default_storage_url")]
    pub storage_url: String,

    /// Cap on in-flight upstream calls; 0 disables the cap
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Optional outbound HTTP proxy
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            generate_url: default_generate_url(),
            edit_url: default_edit_url(),
            storage_url: default_storage_url(),
            max_concurrent_requests: default_max_concurrent_requests(),
            proxy_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Whole-request deadline in seconds. Unset means no deadline.
    #[serde(default)]
    pub request_timeout: Option<u64>,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            timeouts: TimeoutsConfig::default(),
            api_key: None,
        }
    }
}

/// Provider credential. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for an empty value, which counts as "not configured".
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Value for the upstream `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Key {}", self.0)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

impl Config {
    /// Apply `FAL_API_KEY` and `PORT` on top of the file configuration.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key = lookup(API_KEY_ENV).and_then(ApiKey::new);

        if let Some(port) = lookup(PORT_ENV) {
            let port = port.trim();
            if !port.is_empty() {
                self.server.port = port
                    .parse()
                    .map_err(|e| anyhow::anyhow!("Invalid {} value {:?}: {}", PORT_ENV, port, e))?;
            }
        }

        Ok(())
    }
}

// Default value functions
fn default_port() -> u16 { 3000 }
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_body_limit_mb() -> usize { 50 }
fn default_generate_url() -> String { "https://queue.fal.run/fal-ai/nano-banana".to_string() }
fn default_edit_url() -> String { "https://queue.fal.run/fal-ai/nano-banana/edit".to_string() }
fn default_storage_url() -> String { "https://fal.run/storage/upload".to_string() }
fn default_max_concurrent_requests() -> usize { 64 }
fn default_connect_timeout() -> u64 { 20 }

/// Get default config file path
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("nanobana-proxy")
        .join("config.toml")
}

/// Load config from file, or return defaults if not found.
///
/// Loading order:
/// 1. Specified path (if provided)
/// 2. ./config.toml (if exists)
/// 3. default_config_path() (usually ~/.config/nanobana-proxy/config.toml)
///
/// The environment is applied separately with [`Config::apply_env`].
pub fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    if let Some(config_path) = path {
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::info!("Loaded config from specified path {:?}", config_path);
            return Ok(config);
        } else {
            anyhow::bail!("Specified config file not found: {:?}", config_path);
        }
    }

    let local_config = PathBuf::from("config.toml");
    if local_config.exists() {
        match std::fs::read_to_string(&local_config) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from current directory {:?}", local_config);
                    return Ok(config);
                }
                Err(e) => {
                    tracing::error!("Failed to parse ./config.toml: {}. Falling back to default path.", e);
                }
            },
            Err(e) => {
                tracing::error!("Failed to read ./config.toml: {}. Falling back to default path.", e);
            }
        }
    }

    let default_path = default_config_path();
    if default_path.exists() {
        let content = std::fs::read_to_string(&default_path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::info!("Loaded config from default path {:?}", default_path);
        Ok(config)
    } else {
        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }
}
