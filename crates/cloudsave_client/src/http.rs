//! HTTP backend implementation.
//!
//! This module provides an HTTP-based backend for the cloud save service.
//! The actual HTTP client is abstracted via a trait to allow different
//! implementations (reqwest, hyper, etc.).

use crate::backend::RemoteBackend;
use crate::config::ClientConfig;
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use cloudsave_protocol::{
    decode, encode, endpoints, Authorized, BootstrapRequest, BootstrapResponse,
    DeleteFileRequest, DeleteItemRequest, FileMetadata, FileMetadataRequest, ListFilesRequest,
    ListFilesResponse, LoadFileRequest, LoadFileResponse, LoadItemsRequest, LoadItemsResponse,
    Reply, SaveFileRequest, SaveItemsRequest, SignInRequest, SignInResponse,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{trace, warn};

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport.
/// This allows using different HTTP libraries (reqwest, hyper, ureq, etc.)
/// or an in-process server.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a POST request and returns the response body.
    ///
    /// The client fails the request once `timeout` has elapsed.
    async fn post(&self, url: &str, body: Vec<u8>, timeout: Duration)
        -> Result<Vec<u8>, String>;

    /// Checks if the client is connected/healthy.
    fn is_healthy(&self) -> bool;
}

/// HTTP-based backend.
///
/// Uses CBOR encoding for request/response bodies. Scoped requests are
/// wrapped in [`Authorized`] and every response body is a [`Reply`].
pub struct HttpBackend<C: HttpClient> {
    /// Base URL of the service (e.g., "https://save.example.com").
    base_url: String,
    /// HTTP client implementation.
    client: C,
    /// Per-request timeout handed to the client.
    timeout: Duration,
    /// Last transport error message.
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpBackend<C> {
    /// Creates a new HTTP backend with a 30 second request timeout.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout: Duration::from_secs(30),
            last_error: RwLock::new(None),
        }
    }

    /// Creates a backend for the base URL and request timeout of `config`.
    pub fn from_config(config: &ClientConfig, client: C) -> Self {
        Self::new(config.base_url.as_str(), client).with_timeout(config.request_timeout)
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    async fn post_cbor<Req, Res>(&self, endpoint: &str, request: &Req) -> BackendResult<Res>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned,
    {
        if !self.client.is_healthy() {
            return Err(BackendError::Transport("http client is unavailable".into()));
        }

        let body = encode(request)?;
        let url = format!("{}{}", self.base_url, endpoint);
        trace!(%url, bytes = body.len(), "posting request");

        let response_body = self.client.post(&url, body, self.timeout).await.map_err(|e| {
            warn!(%url, error = %e, "request failed");
            *self.last_error.write() = Some(e.clone());
            BackendError::Transport(e)
        })?;
        *self.last_error.write() = None;

        let reply: Reply<Res> = decode(&response_body)?;
        reply.map_err(BackendError::Remote)
    }

    async fn post_authorized<Req, Res>(
        &self,
        endpoint: &str,
        token: &str,
        request: &Req,
    ) -> BackendResult<Res>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned,
    {
        self.post_cbor(endpoint, &Authorized::new(token, request))
            .await
    }
}

#[async_trait]
impl<C: HttpClient> RemoteBackend for HttpBackend<C> {
    async fn bootstrap(&self, request: &BootstrapRequest) -> BackendResult<BootstrapResponse> {
        self.post_cbor(endpoints::BOOTSTRAP, request).await
    }

    async fn sign_in_anonymously(&self, request: &SignInRequest) -> BackendResult<SignInResponse> {
        self.post_cbor(endpoints::SIGN_IN_ANONYMOUS, request).await
    }

    async fn save_items(&self, token: &str, request: &SaveItemsRequest) -> BackendResult<()> {
        self.post_authorized(endpoints::SAVE_ITEMS, token, request)
            .await
    }

    async fn load_items(
        &self,
        token: &str,
        request: &LoadItemsRequest,
    ) -> BackendResult<LoadItemsResponse> {
        self.post_authorized(endpoints::LOAD_ITEMS, token, request)
            .await
    }

    async fn delete_item(&self, token: &str, request: &DeleteItemRequest) -> BackendResult<()> {
        self.post_authorized(endpoints::DELETE_ITEM, token, request)
            .await
    }

    async fn save_file(&self, token: &str, request: &SaveFileRequest) -> BackendResult<()> {
        self.post_authorized(endpoints::SAVE_FILE, token, request)
            .await
    }

    async fn load_file(
        &self,
        token: &str,
        request: &LoadFileRequest,
    ) -> BackendResult<LoadFileResponse> {
        self.post_authorized(endpoints::LOAD_FILE, token, request)
            .await
    }

    async fn file_metadata(
        &self,
        token: &str,
        request: &FileMetadataRequest,
    ) -> BackendResult<FileMetadata> {
        self.post_authorized(endpoints::FILE_METADATA, token, request)
            .await
    }

    async fn list_files(&self, token: &str) -> BackendResult<ListFilesResponse> {
        self.post_authorized(endpoints::LIST_FILES, token, &ListFilesRequest)
            .await
    }

    async fn delete_file(&self, token: &str, request: &DeleteFileRequest) -> BackendResult<()> {
        self.post_authorized(endpoints::DELETE_FILE, token, request)
            .await
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer {
    /// Handles a POST request and returns the response.
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String>;
}

/// A loopback HTTP client that routes requests directly to a server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }

    /// Returns the server behind this client.
    pub fn server(&self) -> &S {
        &self.server
    }
}

#[async_trait]
impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        _timeout: Duration,
    ) -> Result<Vec<u8>, String> {
        // Strip scheme and host; the call completes synchronously
        let path = url.find("/v1/").map(|i| &url[i..]).unwrap_or(url);

        self.server.handle_post(path, &body)
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use cloudsave_protocol::{RemoteError, PROTOCOL_VERSION};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct TestClient {
        response: RwLock<Option<Vec<u8>>>,
        healthy: AtomicBool,
        last_url: Mutex<Option<String>>,
        last_timeout: Mutex<Option<Duration>>,
    }

    impl TestClient {
        fn new() -> Self {
            Self {
                response: RwLock::new(None),
                healthy: AtomicBool::new(true),
                last_url: Mutex::new(None),
                last_timeout: Mutex::new(None),
            }
        }

        fn set_response(&self, resp: Vec<u8>) {
            *self.response.write() = Some(resp);
        }

        fn set_healthy(&self, healthy: bool) {
            self.healthy.store(healthy, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl HttpClient for TestClient {
        async fn post(
            &self,
            url: &str,
            _body: Vec<u8>,
            timeout: Duration,
        ) -> Result<Vec<u8>, String> {
            *self.last_url.lock() = Some(url.to_string());
            *self.last_timeout.lock() = Some(timeout);
            self.response
                .read()
                .clone()
                .ok_or_else(|| "connection refused".into())
        }

        fn is_healthy(&self) -> bool {
            self.healthy.load(Ordering::SeqCst)
        }
    }

    fn bootstrap() -> BootstrapRequest {
        BootstrapRequest::new("proj", "dev")
    }

    #[test]
    fn backend_creation() {
        let backend = HttpBackend::new("https://save.example.com/", TestClient::new());
        assert_eq!(backend.base_url(), "https://save.example.com");
        assert!(backend.last_error().is_none());
        assert_eq!(backend.timeout(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn config_sets_url_and_timeout() {
        let config = ClientConfig::new("proj", "https://save.example.com/")
            .with_request_timeout(Duration::from_secs(5));
        let client = TestClient::new();
        let reply: Reply<BootstrapResponse> = Ok(BootstrapResponse {
            protocol_version: PROTOCOL_VERSION,
        });
        client.set_response(encode(&reply).unwrap());

        let backend = HttpBackend::from_config(&config, client);
        backend.bootstrap(&bootstrap()).await.unwrap();

        assert_eq!(backend.base_url(), "https://save.example.com");
        assert_eq!(
            backend.client().last_url.lock().as_deref(),
            Some("https://save.example.com/v1/bootstrap")
        );
        assert_eq!(
            *backend.client().last_timeout.lock(),
            Some(Duration::from_secs(5))
        );
    }

    #[tokio::test]
    async fn bootstrap_success() {
        let client = TestClient::new();
        let reply: Reply<BootstrapResponse> = Ok(BootstrapResponse {
            protocol_version: PROTOCOL_VERSION,
        });
        client.set_response(encode(&reply).unwrap());

        let backend = HttpBackend::new("https://save.example.com", client);
        let response = backend.bootstrap(&bootstrap()).await.unwrap();

        assert_eq!(response.protocol_version, PROTOCOL_VERSION);
        assert_eq!(
            backend.client().last_url.lock().as_deref(),
            Some("https://save.example.com/v1/bootstrap")
        );
    }

    #[tokio::test]
    async fn remote_error_is_passed_through() {
        let client = TestClient::new();
        let reply: Reply<LoadFileResponse> = Err(RemoteError::not_found("file 'a' not found"));
        client.set_response(encode(&reply).unwrap());

        let backend = HttpBackend::new("https://save.example.com", client);
        let err = backend
            .load_file("tok", &LoadFileRequest { key: "a".into() })
            .await
            .unwrap_err();

        assert_eq!(err.into_store("a"), StoreError::not_found("a"));
    }

    #[tokio::test]
    async fn post_failure_is_transport() {
        let backend = HttpBackend::new("https://save.example.com", TestClient::new());
        let err = backend.bootstrap(&bootstrap()).await.unwrap_err();

        assert!(matches!(err, BackendError::Transport(ref m) if m == "connection refused"));
        assert_eq!(backend.last_error().as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn garbage_reply_is_protocol_error() {
        let client = TestClient::new();
        client.set_response(vec![0xff, 0x00, 0x13]);

        let backend = HttpBackend::new("https://save.example.com", client);
        let err = backend.list_files("tok").await.unwrap_err();

        assert!(matches!(err, BackendError::Protocol(_)));
        assert_eq!(err.into_store("").reason(), Some("malformed_response"));
    }

    #[tokio::test]
    async fn unhealthy_client_is_transport() {
        let client = TestClient::new();
        client.set_healthy(false);
        let backend = HttpBackend::new("https://save.example.com", client);

        let err = backend.bootstrap(&bootstrap()).await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
        assert!(backend.client().last_url.lock().is_none());
    }

    struct EchoPath;

    impl LoopbackServer for EchoPath {
        fn handle_post(&self, path: &str, _body: &[u8]) -> Result<Vec<u8>, String> {
            Ok(path.as_bytes().to_vec())
        }
    }

    #[tokio::test]
    async fn loopback_strips_host() {
        let client = LoopbackClient::new(EchoPath);
        let body = client
            .post("https://save.example.com/v1/files/list", Vec::new(), Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(body, b"/v1/files/list");
    }
}
