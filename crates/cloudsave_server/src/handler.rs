//! Request handlers for CloudSave endpoints.

use crate::auth::{AuthConfig, TokenValidator};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::store::PlayerStore;
use cloudsave_protocol::{
    BootstrapRequest, BootstrapResponse, DeleteFileRequest, DeleteItemRequest, FileMetadata,
    FileMetadataRequest, ListFilesResponse, LoadFileRequest, LoadFileResponse, LoadItemsRequest,
    LoadItemsResponse, SaveFileRequest, SaveItemsRequest, SignInRequest, SignInResponse,
    PROTOCOL_VERSION,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Context for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Player data (shared across all handlers).
    pub store: Arc<PlayerStore>,
    validator: TokenValidator,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(config: ServerConfig, store: Arc<PlayerStore>) -> Self {
        let validator = TokenValidator::new(
            AuthConfig::new(config.auth_secret.clone()).with_expiry(config.token_expiry),
        );
        Self {
            config,
            store,
            validator,
        }
    }

    /// Resolves an access token to the player it was issued to.
    pub fn authenticate(&self, access_token: &str) -> ServerResult<Uuid> {
        self.validator.validate_token(access_token)
    }

    fn check_project(&self, project_id: &str) -> ServerResult<()> {
        if self.config.accepts_project(project_id) {
            Ok(())
        } else {
            Err(ServerError::UnknownProject(project_id.to_string()))
        }
    }

    fn check_key(&self, key: &str) -> ServerResult<()> {
        if key.is_empty() {
            return Err(ServerError::InvalidRequest("key must not be empty".into()));
        }
        if key.len() > self.config.max_key_len {
            return Err(ServerError::InvalidRequest(format!(
                "key is longer than {} bytes",
                self.config.max_key_len
            )));
        }
        Ok(())
    }

    fn check_batch(&self, len: usize) -> ServerResult<()> {
        if len > self.config.max_batch_items {
            return Err(ServerError::InvalidRequest(format!(
                "Too many keys: {} > {}",
                len, self.config.max_batch_items
            )));
        }
        Ok(())
    }
}

/// Handler for CloudSave requests.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Returns the handler context.
    pub fn context(&self) -> &HandlerContext {
        &self.context
    }

    /// Handles a bootstrap request.
    pub fn handle_bootstrap(&self, request: BootstrapRequest) -> ServerResult<BootstrapResponse> {
        if request.protocol_version != PROTOCOL_VERSION {
            return Err(ServerError::ProtocolMismatch(format!(
                "Unsupported protocol version: {}",
                request.protocol_version
            )));
        }
        self.context.check_project(&request.project_id)?;

        debug!(project = %request.project_id, environment = %request.environment, "bootstrap");
        Ok(BootstrapResponse {
            protocol_version: PROTOCOL_VERSION,
        })
    }

    /// Handles an anonymous sign-in request.
    pub fn handle_sign_in(&self, request: SignInRequest) -> ServerResult<SignInResponse> {
        self.context.check_project(&request.project_id)?;

        let player_id = Uuid::new_v4();
        let access_token = self.context.validator.create_token(player_id)?;
        self.context.store.create_player(player_id);

        info!(%player_id, "anonymous player signed in");
        Ok(SignInResponse {
            player_id: player_id.to_string(),
            access_token,
        })
    }

    /// Handles a batched key-value write.
    pub fn handle_save_items(&self, player: &Uuid, request: SaveItemsRequest) -> ServerResult<()> {
        if request.items.is_empty() {
            return Err(ServerError::InvalidRequest("nothing to save".into()));
        }
        self.context.check_batch(request.items.len())?;
        for key in request.items.keys() {
            self.context.check_key(key)?;
        }
        self.context.store.save_items(player, request.items)
    }

    /// Handles a batched key-value read.
    pub fn handle_load_items(
        &self,
        player: &Uuid,
        request: LoadItemsRequest,
    ) -> ServerResult<LoadItemsResponse> {
        self.context.check_batch(request.keys.len())?;
        for key in &request.keys {
            self.context.check_key(key)?;
        }
        let items = self.context.store.load_items(player, &request.keys)?;
        Ok(LoadItemsResponse { items })
    }

    /// Handles a key-value delete.
    pub fn handle_delete_item(
        &self,
        player: &Uuid,
        request: DeleteItemRequest,
    ) -> ServerResult<()> {
        self.context.check_key(&request.key)?;
        self.context.store.delete_item(player, &request.key)
    }

    /// Handles a file upload.
    pub fn handle_save_file(&self, player: &Uuid, request: SaveFileRequest) -> ServerResult<()> {
        self.context.check_key(&request.key)?;
        if request.data.is_empty() {
            return Err(ServerError::InvalidRequest("file is empty".into()));
        }
        if request.data.len() > self.context.config.max_file_bytes {
            return Err(ServerError::InvalidRequest(format!(
                "file is larger than {} bytes",
                self.context.config.max_file_bytes
            )));
        }
        self.context
            .store
            .save_file(player, &request.key, request.data)
    }

    /// Handles a file download.
    pub fn handle_load_file(
        &self,
        player: &Uuid,
        request: LoadFileRequest,
    ) -> ServerResult<LoadFileResponse> {
        self.context.check_key(&request.key)?;
        let data = self.context.store.load_file(player, &request.key)?;
        Ok(LoadFileResponse { data })
    }

    /// Handles a single file metadata read.
    pub fn handle_file_metadata(
        &self,
        player: &Uuid,
        request: FileMetadataRequest,
    ) -> ServerResult<FileMetadata> {
        self.context.check_key(&request.key)?;
        self.context.store.file_metadata(player, &request.key)
    }

    /// Handles a metadata listing.
    pub fn handle_list_files(&self, player: &Uuid) -> ServerResult<ListFilesResponse> {
        let files = self.context.store.list_files(player)?;
        Ok(ListFilesResponse { files })
    }

    /// Handles a file delete.
    pub fn handle_delete_file(
        &self,
        player: &Uuid,
        request: DeleteFileRequest,
    ) -> ServerResult<()> {
        self.context.check_key(&request.key)?;
        self.context.store.delete_file(player, &request.key)
    }
}
