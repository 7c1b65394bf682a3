//! Event listing and detail.

use tracing::{debug, instrument, warn};

use ticketflow_core::EventId;

use crate::api::{ApiClient, Event};
use crate::error::StorefrontError;

/// What the event listing shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogView {
    /// The listing could not be fetched.
    Unavailable { message: String, api_url: String },
    /// The service answered with no events.
    Empty,
    Listing(Vec<Event>),
}

impl CatalogView {
    /// Hint pointing at the configured service, for the unavailable state.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Unavailable { api_url, .. } => {
                Some(format!("Ensure the ticketing API is running at {api_url}"))
            }
            _ => None,
        }
    }
}

/// Fetch the event listing.
#[instrument(skip_all)]
pub async fn load_catalog(api: &ApiClient) -> CatalogView {
    match api.list_events().await {
        Ok(events) if events.is_empty() => CatalogView::Empty,
        Ok(events) => {
            debug!(count = events.len(), "Events loaded");
            CatalogView::Listing(events)
        }
        Err(e) => CatalogView::Unavailable {
            message: e.message(),
            api_url: api.base_url().as_str().trim_end_matches('/').to_string(),
        },
    }
}

/// Fetch one event. Any failure reads as "not found".
///
/// # Errors
///
/// Returns [`StorefrontError::NotFound`] if the event cannot be fetched.
#[instrument(skip_all, fields(event_id = %id))]
pub async fn load_event(api: &ApiClient, id: &EventId) -> Result<Event, StorefrontError> {
    api.get_event(id).await.map_err(|e| {
        warn!(error = %e, "Event lookup failed");
        StorefrontError::NotFound(format!("event {id}"))
    })
}
