use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use flashdeck::FlashdeckConfig;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds. Covers image downloads, so keep it above
    /// the per-image timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log filter, e.g. `info` or `server=debug,canonical=info`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional YAML pipeline configuration (see `FlashdeckConfig`)
    #[serde(default)]
    pub pipeline_config: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            pipeline_config: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server.*` file, and
    /// `FLASHDECK_SERVER__*` environment variables, in increasing priority.
    pub fn load() -> anyhow::Result<Self> {
        // A missing .env file is normal outside development.
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("server").required(false))
            .add_source(config::Environment::with_prefix("FLASHDECK_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be > 0");
        }
        if self.max_body_size_mb == 0 {
            anyhow::bail!("max_body_size_mb must be > 0");
        }
        self.socket_addr()?;
        Ok(())
    }

    /// Pipeline configuration from `pipeline_config`, or defaults.
    pub fn load_pipeline(&self) -> anyhow::Result<FlashdeckConfig> {
        match &self.pipeline_config {
            Some(path) => Ok(FlashdeckConfig::from_file(path)?),
            None => Ok(FlashdeckConfig::default()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_body_size_mb() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
