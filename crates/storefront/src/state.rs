//! The storefront context shared by every flow.

use std::sync::Arc;

use tracing::info;

use ticketflow_core::EventId;

use crate::api::ApiClient;
use crate::checkout::{CheckoutPage, CheckoutRoute};
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::seats::SeatPage;
use crate::session::{FileStorage, SessionStorage, SessionStore};

/// Configuration, API client and session for one process.
///
/// Created once at startup and handed to whatever needs it. Cheaply
/// cloneable via `Arc`.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    api: ApiClient,
    session: SessionStore,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("api", &self.inner.api)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Build the context with the session file from `config`, and restore
    /// the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub async fn new(config: StorefrontConfig) -> Result<Self> {
        let storage = FileStorage::new(config.session_file());
        Self::with_storage(config, storage).await
    }

    /// Build the context over a caller-supplied session storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub async fn with_storage(
        config: StorefrontConfig,
        storage: impl SessionStorage + 'static,
    ) -> Result<Self> {
        let api = ApiClient::from_config(&config)?;
        let session = SessionStore::new(api.clone(), storage);
        let restored = session.restore().await;
        info!(api_url = %config.api_url, restored, "Storefront ready");

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                api,
                session,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// A loaded seat page for `event_id`.
    pub async fn seat_page(&self, event_id: EventId) -> SeatPage {
        let mut page = SeatPage::new(event_id);
        page.load(self.api()).await;
        page
    }

    /// Run checkout for `route` as the signed-in user.
    pub async fn checkout(&self, route: CheckoutRoute) -> CheckoutPage {
        let user = self.session().identity().await;
        let mut page = CheckoutPage::new(route);
        page.run(self.api(), user.as_ref()).await;
        page
    }
}
