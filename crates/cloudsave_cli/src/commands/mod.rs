//! CLI command implementations.
//!
//! Every command runs against a reference server living in the same
//! process, reached through the loopback HTTP backend.

pub mod book;
pub mod files;
pub mod profile;

use cloudsave_client::{
    ClientConfig, CloudSave, HttpBackend, LoopbackClient, LoopbackServer, StatusReporter,
    StoreError,
};
use cloudsave_server::{CloudSaveServer, ServerConfig};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Base URL the loopback client pretends to talk to.
const LOCAL_BASE_URL: &str = "http://localhost:8080";

/// Errors that end a command.
#[derive(Error, Debug)]
pub enum CliError {
    /// A cloud operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Local file I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad command-line input.
    #[error("{0}")]
    Usage(String),
}

/// Routes loopback posts into the in-process server.
pub struct LocalServer(Arc<CloudSaveServer>);

impl LoopbackServer for LocalServer {
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String> {
        self.0.handle_post(path, body)
    }
}

/// Client type used by every command.
pub type LocalCloud = CloudSave<HttpBackend<LoopbackClient<LocalServer>>>;

/// Starts an in-process server and returns a client for it.
pub fn local_cloud(project: &str) -> LocalCloud {
    debug!(project, "starting in-process service");
    let server = Arc::new(CloudSaveServer::new(
        ServerConfig::default().with_project(project),
    ));
    let config = ClientConfig::new(project, LOCAL_BASE_URL);
    let backend = HttpBackend::from_config(&config, LoopbackClient::new(LocalServer(server)));
    CloudSave::new(config, backend)
}

/// Initializes and signs in, reporting each step.
pub async fn connect(cloud: &LocalCloud, reporter: &StatusReporter) -> Result<String, CliError> {
    reporter.info("Initializing cloud services...");
    let init = cloud.initialize().await;
    reporter.report("Initialize", &init, |_| "Cloud services initialized".to_string());
    init?;

    let signed_in = cloud.sign_in_anonymously().await;
    reporter.report("Sign in", &signed_in, |player| format!("Signed in as {}", player));
    Ok(signed_in?)
}
