//! Test fixtures and client helpers.
//!
//! Provides ready-made clients wired either to an in-memory backend or to
//! the reference server through the loopback HTTP backend.

use cloudsave_client::{
    ClientConfig, CloudSave, HttpBackend, LoopbackClient, LoopbackServer, MemoryBackend,
};
use cloudsave_server::{CloudSaveServer, ServerConfig};
use std::sync::Arc;

/// Project id used by every fixture.
pub const TEST_PROJECT: &str = "testkit-project";

/// Base URL used by loopback fixtures.
pub const TEST_BASE_URL: &str = "http://cloudsave.test";

/// Routes loopback posts into an in-process [`CloudSaveServer`].
#[derive(Clone)]
pub struct InProcessServer {
    server: Arc<CloudSaveServer>,
}

impl InProcessServer {
    /// Wraps a server.
    pub fn new(server: Arc<CloudSaveServer>) -> Self {
        Self { server }
    }

    /// Returns the wrapped server.
    pub fn server(&self) -> &Arc<CloudSaveServer> {
        &self.server
    }
}

impl LoopbackServer for InProcessServer {
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String> {
        self.server.handle_post(path, body)
    }
}

/// Backend type of loopback fixtures.
pub type LoopbackBackend = HttpBackend<LoopbackClient<InProcessServer>>;

/// Client configuration used by every fixture.
pub fn test_config() -> ClientConfig {
    ClientConfig::new(TEST_PROJECT, TEST_BASE_URL).with_environment("test")
}

/// A client talking to a fresh reference server.
pub struct LoopbackCloud {
    /// The client.
    pub cloud: CloudSave<LoopbackBackend>,
    /// The server behind it.
    pub server: Arc<CloudSaveServer>,
}

impl LoopbackCloud {
    /// Creates a client and server with default server settings.
    pub fn new() -> Self {
        Self::with_server_config(ServerConfig::default())
    }

    /// Creates a client and server with custom server settings.
    pub fn with_server_config(config: ServerConfig) -> Self {
        let server = Arc::new(CloudSaveServer::new(config));
        let cloud = Self::client_for(&server);
        Self { cloud, server }
    }

    /// Creates another client of the same server, e.g. a second device.
    pub fn client_for(server: &Arc<CloudSaveServer>) -> CloudSave<LoopbackBackend> {
        let client = LoopbackClient::new(InProcessServer::new(Arc::clone(server)));
        let config = test_config();
        let backend = HttpBackend::from_config(&config, client);
        CloudSave::new(config, backend)
    }

    /// Creates a client that has already initialized and signed in.
    ///
    /// # Panics
    ///
    /// Panics if the reference server rejects the sign-in.
    pub async fn ready() -> Self {
        let fixture = Self::new();
        fixture
            .cloud
            .connect()
            .await
            .expect("loopback sign-in failed");
        fixture
    }
}

impl Default for LoopbackCloud {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates a client over a fresh in-memory backend.
pub fn memory_cloud() -> (CloudSave<Arc<MemoryBackend>>, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    (CloudSave::new(test_config(), Arc::clone(&backend)), backend)
}

/// Creates an in-memory client that has already initialized and signed in.
///
/// # Panics
///
/// Panics if the in-memory sign-in fails, which only happens when failures
/// were queued on the backend.
pub async fn ready_memory_cloud() -> (CloudSave<Arc<MemoryBackend>>, Arc<MemoryBackend>) {
    let (cloud, backend) = memory_cloud();
    cloud.connect().await.expect("in-memory sign-in failed");
    (cloud, backend)
}
