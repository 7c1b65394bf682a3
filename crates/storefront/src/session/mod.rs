//! Authenticated session with durable persistence.
//!
//! # Lifecycle
//!
//! ```text
//! UNINITIALIZED --restore()--> READY(anonymous) <--login/register/logout--> READY(authenticated)
//! ```
//!
//! [`SessionStore::restore`] reads the persisted record once and marks the
//! session ready whatever it finds. Login, registration and logout replace the
//! whole [`Session`] under one write lock, with the backing storage updated in
//! the same critical section, so memory and disk never disagree and no
//! interleaving leaves a credential without an identity.
//!
//! The store is an explicit handle: construct one at startup (see
//! [`crate::Storefront`]) and pass it to whatever needs it.

pub mod storage;

use std::sync::Arc;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use ticketflow_core::Email;
use ticketflow_core::input::{Credentials, Registration};

use crate::api::{ApiClient, ApiError, ApiErrorKind, AuthResponse, BearerToken, LoginRequest, RegisterRequest, User};
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};

pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The store was used before [`SessionStore::restore`] ran.
    #[error("session store used before restore")]
    NotReady,

    /// The auth endpoint rejected the request or could not be reached.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// The auth endpoint answered success without a usable token.
    #[error("authentication response did not include a token")]
    IncompleteAuth,

    /// The session record could not be written or removed.
    #[error("could not persist session: {0}")]
    Storage(#[from] StorageError),

    /// The session record could not be encoded.
    #[error("could not encode session record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SessionError {
    /// Whether this error indicates a fault rather than, say, a wrong password.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Api(err) => !matches!(err.kind(), ApiErrorKind::Protocol),
            Self::NotReady | Self::IncompleteAuth | Self::Storage(_) | Self::Encode(_) => true,
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// Who is signed in, and the credential that proves it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    credential: Option<BearerToken>,
    identity: Option<User>,
    ready: bool,
}

/// What an account header should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountView<'a> {
    /// Restore has not finished; show nothing yet.
    Pending,
    /// Offer log in / sign up.
    SignedOut,
    /// Show the account and a log out control.
    SignedIn(&'a User),
}

impl Session {
    /// Bearer credential, if any.
    #[must_use]
    pub const fn credential(&self) -> Option<&BearerToken> {
        self.credential.as_ref()
    }

    /// Signed-in account, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&User> {
        self.identity.as_ref()
    }

    /// Whether the initial restore has completed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Identity and credential together, when both are present.
    #[must_use]
    pub const fn authenticated(&self) -> Option<(&User, &BearerToken)> {
        match (&self.identity, &self.credential) {
            (Some(user), Some(token)) => Some((user, token)),
            _ => None,
        }
    }

    /// Whether both identity and credential are present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated().is_some()
    }

    /// Header state for this session.
    #[must_use]
    pub const fn account_view(&self) -> AccountView<'_> {
        if !self.ready {
            return AccountView::Pending;
        }
        match &self.identity {
            Some(user) => AccountView::SignedIn(user),
            None => AccountView::SignedOut,
        }
    }

    const fn anonymous() -> Self {
        Self {
            credential: None,
            identity: None,
            ready: true,
        }
    }
}

/// On-disk shape: `{"token": ..., "user": {...}}`.
#[derive(Deserialize)]
struct StoredRecord {
    token: Option<String>,
    user: Option<User>,
}

#[derive(Serialize)]
struct RecordRef<'a> {
    token: &'a str,
    user: &'a User,
}

/// Parse a persisted record; anything short of a token plus a user is `None`.
fn parse_record(raw: &str) -> Option<(BearerToken, User)> {
    let record: StoredRecord = serde_json::from_str(raw).ok()?;
    match (record.token, record.user) {
        (Some(token), Some(user)) if !token.is_empty() => Some((BearerToken::new(token), user)),
        _ => None,
    }
}

// =============================================================================
// SessionStore
// =============================================================================

/// Owner of the process-wide [`Session`].
///
/// Cheaply cloneable; clones share the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    api: ApiClient,
    storage: Box<dyn SessionStorage>,
    state: RwLock<Session>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create an uninitialized store. Call [`Self::restore`] before use.
    pub fn new(api: ApiClient, storage: impl SessionStorage + 'static) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                api,
                storage: Box::new(storage),
                state: RwLock::new(Session::default()),
            }),
        }
    }

    /// Load the persisted session, once.
    ///
    /// A record missing either the token or the user, or one that fails to
    /// parse, is discarded and removed. Storage read failures leave the
    /// session anonymous. Either way the session becomes ready; later calls
    /// are no-ops. Returns whether a session was restored.
    pub async fn restore(&self) -> bool {
        let mut state = self.inner.state.write().await;
        if state.ready {
            return state.is_authenticated();
        }

        let restored = match self.inner.storage.load() {
            Ok(Some(raw)) => {
                let parsed = parse_record(&raw);
                if parsed.is_none() {
                    warn!("Discarding malformed session record");
                    if let Err(e) = self.inner.storage.clear() {
                        warn!(error = %e, "Failed to remove malformed session record");
                    }
                }
                parsed
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read session record");
                None
            }
        };

        *state = match restored {
            Some((token, user)) => {
                info!(user_id = %user.id, "Session restored");
                set_sentry_user(&user.id, Some(user.email.as_str()));
                Session {
                    credential: Some(token),
                    identity: Some(user),
                    ready: true,
                }
            }
            None => {
                debug!("No session to restore");
                Session::anonymous()
            }
        };

        state.is_authenticated()
    }

    /// Copy of the current session.
    pub async fn snapshot(&self) -> Session {
        self.inner.state.read().await.clone()
    }

    /// Whether [`Self::restore`] has completed.
    pub async fn is_ready(&self) -> bool {
        self.inner.state.read().await.ready
    }

    /// Signed-in account, if any.
    pub async fn identity(&self) -> Option<User> {
        self.inner.state.read().await.identity.clone()
    }

    /// Current bearer credential, if any.
    pub async fn credential(&self) -> Option<BearerToken> {
        self.inner.state.read().await.credential.clone()
    }

    async fn ensure_ready(&self) -> Result<(), SessionError> {
        if self.inner.state.read().await.ready {
            Ok(())
        } else {
            Err(SessionError::NotReady)
        }
    }

    /// Sign in with an email and password.
    ///
    /// On success the session is persisted and adopted. On failure the
    /// session is unchanged and the error carries the service's message.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the store is not ready, the credentials are
    /// rejected, or the session cannot be persisted.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<User, SessionError> {
        self.ensure_ready().await?;
        debug!("Login started");

        let response = self
            .inner
            .api
            .login(&LoginRequest { email, password })
            .await
            .inspect_err(|e| warn!(error = %e, "Login failed"))?;

        self.adopt(response).await
    }

    /// Sign in with sanitized form credentials.
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn login_with(&self, credentials: &Credentials) -> Result<User, SessionError> {
        self.login(&credentials.email, &credentials.password).await
    }

    /// Create an account and sign in as it.
    ///
    /// Same contract as [`Self::login`], against the registration endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the store is not ready, registration is
    /// rejected, or the session cannot be persisted.
    #[instrument(skip_all)]
    pub async fn register(
        &self,
        email: &Email,
        password: &SecretString,
        name: &str,
    ) -> Result<User, SessionError> {
        self.ensure_ready().await?;
        debug!("Registration started");

        let response = self
            .inner
            .api
            .register(&RegisterRequest {
                email,
                password,
                name,
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Registration failed"))?;

        self.adopt(response).await
    }

    /// Register with sanitized form fields.
    ///
    /// # Errors
    ///
    /// See [`Self::register`].
    pub async fn register_with(&self, registration: &Registration) -> Result<User, SessionError> {
        self.register(
            &registration.email,
            &registration.password,
            &registration.name,
        )
        .await
    }

    /// Persist and adopt a successful auth response as one step.
    async fn adopt(&self, response: AuthResponse) -> Result<User, SessionError> {
        let AuthResponse { token, user } = response;
        if token.is_empty() {
            warn!("Auth response had an empty token");
            return Err(SessionError::IncompleteAuth);
        }

        let record = serde_json::to_string(&RecordRef {
            token: token.expose(),
            user: &user,
        })?;

        let mut state = self.inner.state.write().await;
        self.inner.storage.save(&record)?;
        *state = Session {
            credential: Some(token),
            identity: Some(user.clone()),
            ready: true,
        };
        drop(state);

        info!(user_id = %user.id, "Signed in");
        set_sentry_user(&user.id, Some(user.email.as_str()));
        add_breadcrumb("auth", "Signed in", Some(&[("user_id", user.id.as_str())]));
        Ok(user)
    }

    /// Sign out: clear storage and reset to anonymous. Idempotent.
    ///
    /// The in-memory session is reset even if removing the record fails.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotReady`] before restore, or
    /// [`SessionError::Storage`] if the record could not be removed.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let mut state = self.inner.state.write().await;
        if !state.ready {
            return Err(SessionError::NotReady);
        }

        let cleared = self.inner.storage.clear();
        let was_signed_in = state.identity.is_some();
        *state = Session::anonymous();
        drop(state);

        clear_sentry_user();
        if was_signed_in {
            info!("Signed out");
        }
        cleared.map_err(SessionError::from)
    }

    /// Replace the in-memory credential only. Storage is not touched.
    pub async fn set_credential(&self, credential: Option<BearerToken>) {
        self.inner.state.write().await.credential = credential;
    }

    /// Replace the in-memory identity only. Storage is not touched.
    pub async fn set_identity(&self, identity: Option<User>) {
        self.inner.state.write().await.identity = identity;
    }
}
