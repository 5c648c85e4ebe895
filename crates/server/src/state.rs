use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use flashdeck::FlashdeckConfig;
use std::sync::Arc;

/// Shared application state
///
/// Read-only after startup; conversions share nothing mutable.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Pipeline configuration applied to every conversion
    pub pipeline: Arc<FlashdeckConfig>,
}

impl ServerState {
    /// Create new server state, loading the pipeline configuration file if set.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let pipeline = config
            .load_pipeline()
            .map_err(|e| ServerError::Config(e.to_string()))?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    pub fn with_pipeline(config: ServerConfig, pipeline: FlashdeckConfig) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }
}
