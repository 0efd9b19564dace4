//! Session lifecycle state machine.
//!
//! A [`SessionManager`] walks through two state axes:
//!
//! ```text
//! init:  Uninitialized → Initializing → Initialized
//!                              └──────→ Failed ──(initialize)──→ Initializing
//! auth:  SignedOut → SigningIn → SignedIn
//!                        └─────→ AuthFailed ──(sign_in)──→ SigningIn
//! ```
//!
//! `SignedIn` is only reachable from `Initialized`, and `Initialized` is
//! terminal, so `SignedIn ⇒ Initialized` always holds. Every store checks
//! [`SessionManager::credentials`] before it issues a remote call.

use crate::backend::RemoteBackend;
use crate::config::ClientConfig;
use crate::error::{StoreError, StoreResult};
use cloudsave_protocol::{BootstrapRequest, SignInRequest, PROTOCOL_VERSION};
use parking_lot::RwLock;
use std::fmt;
use tracing::{debug, info, warn};

/// Initialization state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    /// `initialize` has not been called.
    Uninitialized,
    /// The bootstrap call is in flight.
    Initializing,
    /// Bootstrap succeeded.
    Initialized,
    /// Bootstrap failed. `initialize` may be called again.
    Failed,
}

/// Authentication state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No sign-in attempted.
    SignedOut,
    /// The sign-in call is in flight.
    SigningIn,
    /// Signed in with an anonymous identity.
    SignedIn,
    /// The last sign-in failed. Signing in again is allowed.
    AuthFailed,
}

/// Snapshot of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Initialization state.
    pub init_state: InitState,
    /// Authentication state.
    pub auth_state: AuthState,
    /// Identity issued at sign-in.
    pub player_id: Option<String>,
    /// Message of the most recent initialization or sign-in failure.
    pub last_error: Option<String>,
}

impl Session {
    fn new() -> Self {
        Self {
            init_state: InitState::Uninitialized,
            auth_state: AuthState::SignedOut,
            player_id: None,
            last_error: None,
        }
    }

    /// Returns true if remote operations may be issued.
    pub fn is_ready(&self) -> bool {
        self.init_state == InitState::Initialized && self.auth_state == AuthState::SignedIn
    }
}

/// Credentials of a signed-in session, attached to scoped remote calls.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    player_id: String,
    access_token: String,
}

impl Credentials {
    /// Returns the player identity.
    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Returns the access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("player_id", &self.player_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

struct SessionState {
    session: Session,
    access_token: Option<String>,
}

/// Marks an in-flight transition as failed if its future is dropped before
/// the remote call returns.
struct Transition<'a> {
    state: &'a RwLock<SessionState>,
    abandon: fn(&mut Session),
    armed: bool,
}

impl<'a> Transition<'a> {
    fn begin(state: &'a RwLock<SessionState>, abandon: fn(&mut Session)) -> Self {
        Self {
            state,
            abandon,
            armed: true,
        }
    }

    fn finish(mut self) {
        self.armed = false;
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        if self.armed {
            (self.abandon)(&mut self.state.write().session);
        }
    }
}

fn abandon_initialize(session: &mut Session) {
    if session.init_state == InitState::Initializing {
        session.init_state = InitState::Failed;
        session.last_error = Some("initialization was cancelled".into());
        warn!("initialization dropped before completion");
    }
}

fn abandon_sign_in(session: &mut Session) {
    if session.auth_state == AuthState::SigningIn {
        session.auth_state = AuthState::AuthFailed;
        session.last_error = Some("sign-in was cancelled".into());
        warn!("sign-in dropped before completion");
    }
}

/// Owns the session and gates every store operation.
///
/// Create one per process and share it behind an `Arc`. The internal lock is
/// never held across an `.await`, so overlapping calls on a single-threaded
/// executor never block each other.
pub struct SessionManager<B: RemoteBackend> {
    config: ClientConfig,
    backend: B,
    state: RwLock<SessionState>,
}

impl<B: RemoteBackend> SessionManager<B> {
    /// Creates a new, uninitialized session manager.
    pub fn new(config: ClientConfig, backend: B) -> Self {
        Self {
            config,
            backend,
            state: RwLock::new(SessionState {
                session: Session::new(),
                access_token: None,
            }),
        }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the backend used for remote calls.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns a snapshot of the session.
    pub fn session(&self) -> Session {
        self.state.read().session.clone()
    }

    /// Returns the initialization state.
    pub fn init_state(&self) -> InitState {
        self.state.read().session.init_state
    }

    /// Returns the authentication state.
    pub fn auth_state(&self) -> AuthState {
        self.state.read().session.auth_state
    }

    /// Returns the signed-in identity, if any.
    pub fn player_id(&self) -> Option<String> {
        self.state.read().session.player_id.clone()
    }

    /// Returns true if the session is initialized and signed in.
    pub fn is_ready(&self) -> bool {
        self.state.read().session.is_ready()
    }

    /// Returns the credentials for a scoped remote call.
    ///
    /// Fails with `NotInitialized` or `NotAuthenticated` when the session is
    /// not ready; no network call is made either way.
    pub fn credentials(&self) -> StoreResult<Credentials> {
        let state = self.state.read();
        if state.session.init_state != InitState::Initialized {
            return Err(StoreError::NotInitialized);
        }
        match (
            state.session.auth_state,
            &state.session.player_id,
            &state.access_token,
        ) {
            (AuthState::SignedIn, Some(player_id), Some(access_token)) => Ok(Credentials {
                player_id: player_id.clone(),
                access_token: access_token.clone(),
            }),
            _ => Err(StoreError::NotAuthenticated),
        }
    }

    /// Bootstraps the service connection.
    ///
    /// A no-op when already initialized. Fails with `NotInitialized` when
    /// another initialization is still in flight. A failure, or dropping the
    /// returned future before it completes, leaves the session in `Failed`;
    /// call again to retry.
    pub async fn initialize(&self) -> StoreResult<()> {
        {
            let mut state = self.state.write();
            match state.session.init_state {
                InitState::Initialized => {
                    debug!("cloud services already initialized");
                    return Ok(());
                }
                InitState::Initializing => {
                    debug!("initialization already in flight");
                    return Err(StoreError::NotInitialized);
                }
                InitState::Uninitialized | InitState::Failed => {
                    state.session.init_state = InitState::Initializing;
                }
            }
        }

        info!(
            project = %self.config.project_id,
            environment = %self.config.environment,
            "initializing cloud services"
        );
        let request = BootstrapRequest::new(&self.config.project_id, &self.config.environment);
        let transition = Transition::begin(&self.state, abandon_initialize);
        let result = self.backend.bootstrap(&request).await;
        transition.finish();

        let outcome = match result {
            Ok(response) if response.protocol_version == PROTOCOL_VERSION => Ok(()),
            Ok(response) => Err(StoreError::validation(format!(
                "protocol version mismatch: local={}, remote={}",
                PROTOCOL_VERSION, response.protocol_version
            ))),
            Err(e) => Err(e.into_store("bootstrap")),
        };

        let mut state = self.state.write();
        match outcome {
            Ok(()) => {
                state.session.init_state = InitState::Initialized;
                state.session.last_error = None;
                info!("cloud services initialized");
                Ok(())
            }
            Err(e) => {
                state.session.init_state = InitState::Failed;
                state.session.last_error = Some(e.to_string());
                warn!(error = %e, "cloud services initialization failed");
                Err(e)
            }
        }
    }

    /// Signs in with an anonymous identity and returns the player id.
    ///
    /// Returns the current identity without a network call when already
    /// signed in. Fails with `NotInitialized` before initialization and with
    /// `NotAuthenticated` while another sign-in is in flight. A failure, or
    /// dropping the returned future before it completes, moves the session to
    /// `AuthFailed`; nothing is retried automatically.
    pub async fn sign_in_anonymously(&self) -> StoreResult<String> {
        {
            let mut state = self.state.write();
            if state.session.init_state != InitState::Initialized {
                return Err(StoreError::NotInitialized);
            }
            match (state.session.auth_state, &state.session.player_id) {
                (AuthState::SignedIn, Some(player_id)) => {
                    debug!(player_id = %player_id, "already signed in");
                    return Ok(player_id.clone());
                }
                (AuthState::SigningIn, _) => {
                    debug!("sign-in already in flight");
                    return Err(StoreError::NotAuthenticated);
                }
                _ => state.session.auth_state = AuthState::SigningIn,
            }
        }

        info!("signing in anonymously");
        let request = SignInRequest {
            project_id: self.config.project_id.clone(),
        };
        let transition = Transition::begin(&self.state, abandon_sign_in);
        let result = self.backend.sign_in_anonymously(&request).await;
        transition.finish();

        let outcome = match result {
            Ok(response) if response.player_id.is_empty() || response.access_token.is_empty() => {
                Err(StoreError::Unknown(
                    "sign-in completed but no identity was issued".into(),
                ))
            }
            Ok(response) => Ok(response),
            Err(e) => Err(e.into_store("sign-in")),
        };

        let mut state = self.state.write();
        match outcome {
            Ok(response) => {
                state.session.auth_state = AuthState::SignedIn;
                state.session.player_id = Some(response.player_id.clone());
                state.session.last_error = None;
                state.access_token = Some(response.access_token);
                info!(player_id = %response.player_id, "signed in anonymously");
                Ok(response.player_id)
            }
            Err(e) => {
                state.session.auth_state = AuthState::AuthFailed;
                state.session.last_error = Some(e.to_string());
                warn!(error = %e, kind = %e.kind(), "anonymous sign-in failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Operation;
    use crate::error::{BackendError, ErrorKind};
    use crate::memory::MemoryBackend;
    use cloudsave_protocol::{RemoteError, RemoteErrorCode};
    use std::sync::Arc;
    use std::time::Duration;

    fn manager() -> (SessionManager<Arc<MemoryBackend>>, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let config = ClientConfig::new("project-1", "memory://");
        (SessionManager::new(config, Arc::clone(&backend)), backend)
    }

    #[test]
    fn initial_state() {
        let (session, _) = manager();
        let snapshot = session.session();
        assert_eq!(snapshot.init_state, InitState::Uninitialized);
        assert_eq!(snapshot.auth_state, AuthState::SignedOut);
        assert_eq!(snapshot.player_id, None);
        assert!(!session.is_ready());
        assert_eq!(session.credentials(), Err(StoreError::NotInitialized));
    }

    #[tokio::test]
    async fn initialize_then_sign_in() {
        let (session, backend) = manager();

        session.initialize().await.unwrap();
        assert_eq!(session.init_state(), InitState::Initialized);
        assert!(!session.is_ready());
        assert_eq!(session.credentials(), Err(StoreError::NotAuthenticated));

        let player_id = session.sign_in_anonymously().await.unwrap();
        assert_eq!(player_id, "player-1");
        assert_eq!(session.auth_state(), AuthState::SignedIn);
        assert!(session.is_ready());

        let credentials = session.credentials().unwrap();
        assert_eq!(credentials.player_id(), "player-1");
        assert_eq!(backend.total_calls(), 2);
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let (session, backend) = manager();
        session.initialize().await.unwrap();
        session.initialize().await.unwrap();

        assert_eq!(backend.calls(Operation::Bootstrap), 1);
        assert_eq!(session.init_state(), InitState::Initialized);
    }

    #[tokio::test]
    async fn initialize_failure_is_recoverable() {
        let (session, backend) = manager();
        backend.fail_next(
            Operation::Bootstrap,
            BackendError::Transport("connection reset".into()),
        );

        let err = session.initialize().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(session.init_state(), InitState::Failed);
        assert!(session.session().last_error.is_some());

        session.initialize().await.unwrap();
        assert_eq!(session.init_state(), InitState::Initialized);
        assert_eq!(session.session().last_error, None);
        assert_eq!(backend.calls(Operation::Bootstrap), 2);
    }

    #[tokio::test]
    async fn misconfigured_project_is_validation() {
        let backend = Arc::new(MemoryBackend::new());
        let session = SessionManager::new(ClientConfig::new("", "memory://"), backend);

        let err = session.initialize().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.init_state(), InitState::Failed);
    }

    #[tokio::test]
    async fn sign_in_requires_initialization() {
        let (session, backend) = manager();

        let err = session.sign_in_anonymously().await.unwrap_err();
        assert_eq!(err, StoreError::NotInitialized);
        assert_eq!(session.auth_state(), AuthState::SignedOut);
        assert_eq!(backend.total_calls(), 0);
    }

    #[tokio::test]
    async fn sign_in_twice_returns_same_identity() {
        let (session, backend) = manager();
        session.initialize().await.unwrap();

        let first = session.sign_in_anonymously().await.unwrap();
        let second = session.sign_in_anonymously().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.calls(Operation::SignIn), 1);
    }

    #[tokio::test]
    async fn sign_in_failure_moves_to_auth_failed() {
        let (session, backend) = manager();
        session.initialize().await.unwrap();
        backend.fail_next(
            Operation::SignIn,
            BackendError::Remote(RemoteError::new(
                RemoteErrorCode::InvalidArgument,
                "anonymous sign-in disabled",
            )),
        );

        let err = session.sign_in_anonymously().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.auth_state(), AuthState::AuthFailed);
        assert_eq!(session.init_state(), InitState::Initialized);
        assert!(!session.is_ready());

        // AuthFailed is recoverable
        session.sign_in_anonymously().await.unwrap();
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn sign_in_network_failure_is_transport() {
        let (session, backend) = manager();
        session.initialize().await.unwrap();
        backend.set_connected(false);

        let err = session.sign_in_anonymously().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(session.auth_state(), AuthState::AuthFailed);
    }

    #[tokio::test]
    async fn overlapping_initialize_is_rejected() {
        let (session, backend) = manager();
        session.state.write().session.init_state = InitState::Initializing;

        let err = session.initialize().await.unwrap_err();
        assert_eq!(err, StoreError::NotInitialized);
        assert_eq!(backend.total_calls(), 0);
    }

    #[test]
    fn credentials_debug_redacts_token() {
        let credentials = Credentials {
            player_id: "p".into(),
            access_token: "secret".into(),
        };
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn overlapping_sign_in_is_rejected() {
        let (session, backend) = manager();
        session.initialize().await.unwrap();
        backend.stall(Operation::SignIn);

        let pending = session.sign_in_anonymously();
        tokio::pin!(pending);
        let polled = tokio::time::timeout(Duration::from_millis(20), &mut pending).await;
        assert!(polled.is_err());
        assert_eq!(session.auth_state(), AuthState::SigningIn);

        let err = session.sign_in_anonymously().await.unwrap_err();
        assert_eq!(err, StoreError::NotAuthenticated);
        assert_eq!(backend.calls(Operation::SignIn), 1);
    }

    #[tokio::test]
    async fn dropped_sign_in_can_be_retried() {
        let (session, backend) = manager();
        session.initialize().await.unwrap();
        backend.stall(Operation::SignIn);

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), session.sign_in_anonymously()).await;
        assert!(timed_out.is_err());
        assert_eq!(session.auth_state(), AuthState::AuthFailed);
        assert!(session.session().last_error.is_some());

        backend.resume(Operation::SignIn);
        assert_eq!(session.sign_in_anonymously().await.unwrap(), "player-1");
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn dropped_initialize_can_be_retried() {
        let (session, backend) = manager();
        backend.stall(Operation::Bootstrap);

        let timed_out = tokio::time::timeout(Duration::from_millis(20), session.initialize()).await;
        assert!(timed_out.is_err());
        assert_eq!(session.init_state(), InitState::Failed);

        backend.resume(Operation::Bootstrap);
        session.initialize().await.unwrap();
        assert_eq!(session.init_state(), InitState::Initialized);
        assert_eq!(backend.calls(Operation::Bootstrap), 2);
    }
}
