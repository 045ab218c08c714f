//! Connected instance pool.
//!
//! # Responsibilities
//! - Keep one vendor client per stored instance
//! - Connect lazily on first use
//! - Periodically rebuild the pool from the store
//!
//! # Design Decisions
//! - Map guards are never held across an await
//! - A failed connection during `pull` is logged and skipped; the instance
//!   is retried on next use

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::time;

use crate::instances::store::InstanceStore;
use crate::instances::{Instance, PoolError};
use crate::vms::{VmsClient, VmsConnector};

/// An instance row paired with its vendor client.
#[derive(Clone)]
pub struct ConnectedInstance {
    pub instance: Instance,
    pub client: Arc<dyn VmsClient>,
}

impl ConnectedInstance {
    /// Display name used as the media server for local channels.
    pub fn server_name(&self) -> &str {
        self.instance.name.as_deref().unwrap_or_default()
    }
}

/// Manages vendor clients for every stored instance.
pub struct InstancePool {
    store: Arc<dyn InstanceStore>,
    connector: Arc<dyn VmsConnector>,
    clients: DashMap<i64, ConnectedInstance>,
}

impl InstancePool {
    pub fn new(store: Arc<dyn InstanceStore>, connector: Arc<dyn VmsConnector>) -> Self {
        Self {
            store,
            connector,
            clients: DashMap::new(),
        }
    }

    /// Cached client for `id`, connecting if there is none yet.
    pub async fn get(&self, id: i64) -> Result<ConnectedInstance, PoolError> {
        if let Some(entry) = self.clients.get(&id) {
            return Ok(entry.value().clone());
        }
        self.connect(id).await
    }

    /// Load `id` from the store and (re)connect it.
    pub async fn connect(&self, id: i64) -> Result<ConnectedInstance, PoolError> {
        let instance = self.store.get(id).await?.ok_or(PoolError::NotFound(id))?;
        self.connect_instance(instance).await
    }

    async fn connect_instance(&self, instance: Instance) -> Result<ConnectedInstance, PoolError> {
        let client = self.connector.connect(&instance).await?;
        let connected = ConnectedInstance { instance, client };
        self.clients.insert(connected.instance.id, connected.clone());
        Ok(connected)
    }

    /// Drop the cached client for `id`.
    pub fn evict(&self, id: i64) {
        self.clients.remove(&id);
    }

    /// Reconnect every stored instance and forget deleted ones.
    /// Returns the number of instances connected.
    pub async fn pull(&self) -> Result<usize, PoolError> {
        let rows = self.store.list().await?;
        self.clients
            .retain(|id, _| rows.iter().any(|row| row.id == *id));

        let results = join_all(rows.into_iter().map(|row| {
            let id = row.id;
            async move { (id, self.connect_instance(row).await) }
        }))
        .await;

        let mut connected = 0;
        for (id, result) in results {
            match result {
                Ok(_) => connected += 1,
                Err(e) => {
                    self.clients.remove(&id);
                    tracing::warn!(instance_id = id, error = %e, "Instance connection failed");
                }
            }
        }

        tracing::debug!(connected, total = self.clients.len(), "Instance pool refreshed");
        Ok(connected)
    }

    /// Number of cached clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Call `pull` every `interval` until shutdown.
    pub async fn run_refresher(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(interval_secs = interval.as_secs(), "Instance refresher starting");

        let mut ticker = time::interval(interval);
        // The first tick completes immediately; startup already pulled.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.pull().await {
                        tracing::error!(error = %e, "Instance refresh failed");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Instance refresher received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::Bytes;

    use crate::instances::{MemoryStore, NewInstance};
    use crate::vms::{ChannelMap, StreamType, VmsError, VmsFuture};

    struct NamedClient(String);

    impl VmsClient for NamedClient {
        fn state(&self) -> String {
            "connected".into()
        }

        fn server_name(&self) -> Option<String> {
            Some(self.0.clone())
        }

        fn channels(&self) -> ChannelMap {
            ChannelMap::new()
        }

        fn screenshot<'a>(&'a self, _: &'a str, _: &'a str) -> VmsFuture<'a, Bytes> {
            Box::pin(async { Err(VmsError::ChannelNotFound) })
        }

        fn video<'a>(&'a self, _: &'a str, _: &'a str, _: StreamType) -> VmsFuture<'a, String> {
            Box::pin(async { Err(VmsError::ChannelNotFound) })
        }
    }

    /// Counts connections; refuses hosts starting with "bad".
    #[derive(Default)]
    struct CountingConnector {
        connects: AtomicUsize,
    }

    impl VmsConnector for CountingConnector {
        fn connect(&self, instance: &Instance) -> VmsFuture<'static, Arc<dyn VmsClient>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let host = instance.ip.clone();
            Box::pin(async move {
                if host.starts_with("bad") {
                    Err(VmsError::Connection(format!("{host} unreachable")))
                } else {
                    Ok(Arc::new(NamedClient(host)) as Arc<dyn VmsClient>)
                }
            })
        }
    }

    fn setup() -> (Arc<MemoryStore>, Arc<CountingConnector>, InstancePool) {
        let store = Arc::new(MemoryStore::new());
        let connector = Arc::new(CountingConnector::default());
        let pool = InstancePool::new(store.clone(), connector.clone());
        (store, connector, pool)
    }

    fn new_instance(ip: &str) -> NewInstance {
        NewInstance {
            ip: ip.into(),
            http_port: 80,
            rtsp_port: 554,
            login: "admin".into(),
            password: "secret".into(),
        }
    }

    #[tokio::test]
    async fn test_get_connects_once() {
        let (store, connector, pool) = setup();
        let id = store.insert(new_instance("10.0.0.1")).await.unwrap().id;

        let first = pool.get(id).await.unwrap();
        let second = pool.get(id).await.unwrap();

        assert_eq!(first.client.server_name().as_deref(), Some("10.0.0.1"));
        assert_eq!(second.instance.id, id);
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_unknown_instance() {
        let (_, _, pool) = setup();
        assert!(matches!(pool.get(42).await, Err(PoolError::NotFound(42))));
    }

    #[tokio::test]
    async fn test_pull_skips_failures_and_drops_deleted() {
        let (store, _, pool) = setup();
        let good = store.insert(new_instance("10.0.0.1")).await.unwrap().id;
        let bad = store.insert(new_instance("bad-host")).await.unwrap().id;
        let gone = store.insert(new_instance("10.0.0.3")).await.unwrap().id;

        assert_eq!(pool.pull().await.unwrap(), 2);
        assert_eq!(pool.len(), 2);

        store.delete(gone).await.unwrap();
        assert_eq!(pool.pull().await.unwrap(), 1);
        assert_eq!(pool.len(), 1);
        assert!(pool.get(good).await.is_ok());
        assert!(matches!(pool.get(bad).await, Err(PoolError::Vms(_))));
    }

    #[tokio::test]
    async fn test_refresher_stops_on_shutdown() {
        let (_, _, pool) = setup();
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(Arc::new(pool).run_refresher(Duration::from_secs(3600), rx));

        tx.send(()).unwrap();
        time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("refresher should exit")
            .unwrap();
    }
}
