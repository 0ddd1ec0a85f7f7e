use std::sync::Arc;
use spotsync_core::{Config, PlatformConnector, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    connector: Arc<dyn PlatformConnector>,
}

impl AppState {
    pub fn new(config: Config, connector: Arc<dyn PlatformConnector>) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// Builds a platform client for each publish request.
    pub fn connector(&self) -> &dyn PlatformConnector {
        self.connector.as_ref()
    }
}
