//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use tokio::net::TcpListener;

use vms_gateway::api::build_dispatcher;
use vms_gateway::config::GatewayConfig;
use vms_gateway::instances::{Instance, InstancePool, InstanceStore, MemoryStore};
use vms_gateway::vms::{
    Channel, ChannelMap, StreamType, VmsClient, VmsConnector, VmsError, VmsFuture, LOCAL_CHANNELS,
};
use vms_gateway::{HttpServer, Shutdown};

pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

/// Vendor client with one local and one remote channel.
pub struct FakeClient {
    name: String,
}

impl VmsClient for FakeClient {
    fn state(&self) -> String {
        "connected".to_string()
    }

    fn server_name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn channels(&self) -> ChannelMap {
        let mut map = ChannelMap::new();
        map.insert(
            LOCAL_CHANNELS,
            vec![Channel {
                guid: "cam-1".into(),
                name: "Entrance".into(),
                server_guid: None,
            }],
        );
        map.insert(
            "remote_channels",
            vec![Channel {
                guid: "cam-9".into(),
                name: "Parking".into(),
                server_guid: Some("remote-srv".into()),
            }],
        );
        map
    }

    fn screenshot<'a>(&'a self, server: &'a str, _channel: &'a str) -> VmsFuture<'a, Bytes> {
        Box::pin(async move {
            if server.is_empty() {
                return Err(VmsError::ChannelNotFound);
            }
            Ok(Bytes::from_static(JPEG))
        })
    }

    fn video<'a>(
        &'a self,
        server: &'a str,
        channel: &'a str,
        stream: StreamType,
    ) -> VmsFuture<'a, String> {
        Box::pin(async move {
            Ok(match stream {
                StreamType::Hls => format!("http://media.test/{server}/{channel}/index.m3u8"),
                StreamType::Rtsp => format!("rtsp://media.test/{server}/{channel}"),
            })
        })
    }
}

/// Connects every instance except those whose ip starts with `unreachable`.
#[derive(Default)]
pub struct FakeConnector;

impl VmsConnector for FakeConnector {
    fn connect(&self, instance: &Instance) -> VmsFuture<'static, Arc<dyn VmsClient>> {
        let ip = instance.ip.clone();
        Box::pin(async move {
            if ip.starts_with("unreachable") {
                return Err(VmsError::Connection(format!("{ip} did not answer")));
            }
            let client: Arc<dyn VmsClient> = Arc::new(FakeClient {
                name: format!("server-{ip}"),
            });
            Ok(client)
        })
    }
}

/// Body for `POST /api/instances`.
pub fn instance_json(ip: &str) -> serde_json::Value {
    serde_json::json!({
        "ip": ip,
        "http_port": 80,
        "rtsp_port": 554,
        "login": "admin",
        "password": "secret",
    })
}

/// A gateway serving on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub store: Arc<dyn InstanceStore>,
    pub pool: Arc<InstancePool>,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway backed by `FakeConnector` and an empty store.
pub async fn spawn_gateway() -> TestGateway {
    let store: Arc<dyn InstanceStore> = Arc::new(MemoryStore::new());
    let pool = Arc::new(InstancePool::new(
        Arc::clone(&store),
        Arc::new(FakeConnector),
    ));
    let dispatcher = Arc::new(build_dispatcher(Arc::clone(&store), Arc::clone(&pool)).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = GatewayConfig::default();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, dispatcher);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    TestGateway {
        addr,
        store,
        pool,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
