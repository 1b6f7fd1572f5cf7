//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dynconf::{ConfigStore, HttpServer, ServiceSettings, Shutdown};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A store server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<ConfigStore>,
    pub shutdown: Shutdown,
    /// Keeps the storage root alive for the duration of the test.
    pub dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server with a fresh temporary storage root.
pub async fn start_server() -> TestServer {
    let dir = TempDir::new().unwrap();
    let mut settings = ServiceSettings::default();
    settings.storage.root = dir.path().to_string_lossy().into_owned();
    settings.listener.bind_address = "127.0.0.1:0".into();

    let store = Arc::new(ConfigStore::new(dir.path()));
    let server = HttpServer::with_store(settings, store.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        store,
        shutdown,
        dir,
    }
}

/// Client that never reuses connections, so shutdown is not delayed.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
