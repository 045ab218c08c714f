//! Connector used when no vendor library is linked in.
//!
//! Every instance reports as `offline` with no channels; media requests fail
//! with `VmsError::Unavailable`. The rest of the API (instance CRUD) works.

use std::sync::Arc;

use axum::body::Bytes;

use crate::config::VmsConfig;
use crate::instances::Instance;
use crate::vms::{ChannelMap, StreamType, VmsClient, VmsConnector, VmsError, VmsFuture};

const UNAVAILABLE: &str = "No vendor client configured";

#[derive(Debug, Clone, Default)]
pub struct OfflineConnector {
    config: VmsConfig,
}

impl OfflineConnector {
    pub fn new(config: VmsConfig) -> Self {
        Self { config }
    }
}

impl VmsConnector for OfflineConnector {
    fn connect(&self, instance: &Instance) -> VmsFuture<'static, Arc<dyn VmsClient>> {
        tracing::debug!(
            instance_id = instance.id,
            host = %instance.ip,
            proxy = ?self.config.proxy,
            "Offline connector in use, skipping device connection"
        );
        let client: Arc<dyn VmsClient> = Arc::new(OfflineClient);
        Box::pin(async move { Ok(client) })
    }
}

#[derive(Debug)]
struct OfflineClient;

impl VmsClient for OfflineClient {
    fn state(&self) -> String {
        "offline".to_string()
    }

    fn server_name(&self) -> Option<String> {
        None
    }

    fn channels(&self) -> ChannelMap {
        ChannelMap::new()
    }

    fn screenshot<'a>(&'a self, _server: &'a str, _channel: &'a str) -> VmsFuture<'a, Bytes> {
        Box::pin(async { Err(VmsError::Unavailable(UNAVAILABLE.to_string())) })
    }

    fn video<'a>(
        &'a self,
        _server: &'a str,
        _channel: &'a str,
        _stream: StreamType,
    ) -> VmsFuture<'a, String> {
        Box::pin(async { Err(VmsError::Unavailable(UNAVAILABLE.to_string())) })
    }
}
