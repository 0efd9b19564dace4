//! Main CloudSave server.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler};
use crate::store::PlayerStore;
use cloudsave_protocol::{decode, encode, endpoints, Authorized, ListFilesRequest, Reply};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// The CloudSave server.
///
/// This server handles CBOR-encoded requests posted to the protocol
/// endpoints and answers every routed request with an encoded [`Reply`].
///
/// # Example
///
/// ```
/// use cloudsave_server::{CloudSaveServer, ServerConfig};
///
/// let server = CloudSaveServer::new(ServerConfig::default());
///
/// // In a real application, you would expose HTTP endpoints
/// // that call server.handle_post(path, body)
/// assert_eq!(server.player_count(), 0);
/// ```
pub struct CloudSaveServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
    requests: AtomicU64,
}

impl CloudSaveServer {
    /// Creates a new server.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, Arc::new(PlayerStore::new()))
    }

    /// Creates a server over an existing player store.
    pub fn with_store(config: ServerConfig, store: Arc<PlayerStore>) -> Self {
        let context = Arc::new(HandlerContext::new(config, store));
        let handler = RequestHandler::new(Arc::clone(&context));

        Self {
            handler,
            context,
            requests: AtomicU64::new(0),
        }
    }

    /// Returns the request handler.
    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Handles a POST to `path`.
    ///
    /// Returns `Err` only for unknown paths and encoding failures, which a
    /// real deployment would answer with a non-2xx status.
    pub fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        debug!(path, bytes = body.len(), "request");

        let h = &self.handler;
        match path {
            endpoints::BOOTSTRAP => self.reply(body, |req| h.handle_bootstrap(req)),
            endpoints::SIGN_IN_ANONYMOUS => self.reply(body, |req| h.handle_sign_in(req)),
            endpoints::SAVE_ITEMS => self.scoped(body, |p, req| h.handle_save_items(p, req)),
            endpoints::LOAD_ITEMS => self.scoped(body, |p, req| h.handle_load_items(p, req)),
            endpoints::DELETE_ITEM => self.scoped(body, |p, req| h.handle_delete_item(p, req)),
            endpoints::SAVE_FILE => self.scoped(body, |p, req| h.handle_save_file(p, req)),
            endpoints::LOAD_FILE => self.scoped(body, |p, req| h.handle_load_file(p, req)),
            endpoints::FILE_METADATA => {
                self.scoped(body, |p, req| h.handle_file_metadata(p, req))
            }
            endpoints::LIST_FILES => {
                self.scoped(body, |p, _: ListFilesRequest| h.handle_list_files(p))
            }
            endpoints::DELETE_FILE => self.scoped(body, |p, req| h.handle_delete_file(p, req)),
            other => {
                warn!(path = other, "no route");
                Err(format!("404 no route for {}", other))
            }
        }
    }

    /// Returns the number of signed-in players.
    pub fn player_count(&self) -> usize {
        self.context.store.player_count()
    }

    /// Returns the number of requests received.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    fn reply<Req, Res>(
        &self,
        body: &[u8],
        handle: impl FnOnce(Req) -> ServerResult<Res>,
    ) -> Result<Vec<u8>, String>
    where
        Req: DeserializeOwned,
        Res: Serialize,
    {
        let result = decode::<Req>(body)
            .map_err(|e| ServerError::InvalidRequest(e.to_string()))
            .and_then(handle);
        respond(result)
    }

    fn scoped<Req, Res>(
        &self,
        body: &[u8],
        handle: impl FnOnce(&Uuid, Req) -> ServerResult<Res>,
    ) -> Result<Vec<u8>, String>
    where
        Req: DeserializeOwned,
        Res: Serialize,
    {
        self.reply(body, |envelope: Authorized<Req>| {
            let player = self.context.authenticate(&envelope.access_token)?;
            handle(&player, envelope.body)
        })
    }
}

fn respond<Res: Serialize>(result: ServerResult<Res>) -> Result<Vec<u8>, String> {
    let reply: Reply<Res> = result.map_err(|e| {
        if e.is_server_error() {
            warn!(error = %e, "request failed");
        } else {
            debug!(error = %e, "request rejected");
        }
        e.to_remote()
    });
    encode(&reply).map_err(|e| e.to_string())
}
