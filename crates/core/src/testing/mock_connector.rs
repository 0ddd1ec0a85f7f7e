//! Mock platform connector for testing.

use std::sync::{Arc, Mutex};

use crate::config::PlatformConfig;
use crate::platform::{BroadcastPlatform, PlatformConnector, PlatformError};

use super::MockPlatform;

/// Hands out the same [`MockPlatform`] for every connection and records the
/// settings each connection was requested with.
#[derive(Debug)]
pub struct MockConnector {
    platform: Arc<MockPlatform>,
    connections: Mutex<Vec<PlatformConfig>>,
    refusal: Mutex<Option<String>>,
}

impl MockConnector {
    pub fn new(platform: Arc<MockPlatform>) -> Self {
        Self {
            platform,
            connections: Mutex::new(Vec::new()),
            refusal: Mutex::new(None),
        }
    }

    /// Make every following connection attempt fail.
    pub fn refuse_connections(&self, reason: &str) {
        if let Ok(mut refusal) = self.refusal.lock() {
            *refusal = Some(reason.to_string());
        }
    }

    /// Settings of every connection requested so far.
    pub fn connections(&self) -> Vec<PlatformConfig> {
        self.connections
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

impl PlatformConnector for MockConnector {
    fn connect(
        &self,
        config: &PlatformConfig,
    ) -> Result<Arc<dyn BroadcastPlatform>, PlatformError> {
        if let Ok(mut connections) = self.connections.lock() {
            connections.push(config.clone());
        }

        let refusal = self.refusal.lock().ok().and_then(|r| r.clone());
        if let Some(reason) = refusal {
            return Err(PlatformError::NotConfigured(reason));
        }

        let platform: Arc<dyn BroadcastPlatform> = self.platform.clone();
        Ok(platform)
    }
}
