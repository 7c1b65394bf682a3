//! Checkout orchestration: turn a reserved seat set into a payment intent.
//!
//! ```text
//! Loading --run()--> Success { order_id, client_secret }
//!            \-----> Error { message }
//! ```
//!
//! Both outcomes are terminal. Nothing is retried automatically; the error
//! state offers a link back to seat selection instead.

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use ticketflow_core::{EventId, OrderId, SeatId};

use crate::api::{ApiClient, ApiError, CheckoutRequest, User};
use crate::error::add_breadcrumb;

/// Shown when the page is missing its user, seats or event.
pub const MISSING_PRECONDITIONS_MESSAGE: &str = "Missing user, seats, or event.";

/// Shown when checkout succeeded but carried no payment intent.
pub const NO_PAYMENT_INTENT_MESSAGE: &str = "No payment intent returned.";

/// Shown when a failed checkout has no readable message of its own.
pub const CHECKOUT_FAILED_MESSAGE: &str = "Checkout failed";

// =============================================================================
// Routes
// =============================================================================

/// Seat selection page for an event.
#[must_use]
pub fn seat_selection_path(event_id: &EventId) -> String {
    format!("/events/{}/seats", urlencoding::encode(event_id.as_str()))
}

/// Split a comma-joined `seatIds` parameter, dropping empty segments.
#[must_use]
pub fn parse_seat_ids(raw: &str) -> Vec<SeatId> {
    raw.split(',')
        .filter(|segment| !segment.is_empty())
        .map(SeatId::from)
        .collect()
}

/// Where a successful reservation hands off to checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRoute {
    pub event_id: EventId,
    pub seat_ids: Vec<SeatId>,
}

impl CheckoutRoute {
    #[must_use]
    pub const fn new(event_id: EventId, seat_ids: Vec<SeatId>) -> Self {
        Self { event_id, seat_ids }
    }

    /// `/events/{id}/checkout?seatIds=a,b`
    #[must_use]
    pub fn path(&self) -> String {
        let seat_ids = self
            .seat_ids
            .iter()
            .map(|id| urlencoding::encode(id.as_str()).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "/events/{}/checkout?seatIds={seat_ids}",
            urlencoding::encode(self.event_id.as_str())
        )
    }

    /// Rebuild a route from its event id and raw `seatIds` parameter.
    #[must_use]
    pub fn from_query(event_id: EventId, seat_ids: Option<&str>) -> Self {
        Self::new(event_id, seat_ids.map(parse_seat_ids).unwrap_or_default())
    }
}

// =============================================================================
// CheckoutPage
// =============================================================================

/// Where a checkout attempt stands.
pub enum CheckoutStatus {
    Loading,
    Success {
        order_id: OrderId,
        client_secret: SecretString,
    },
    Error {
        message: String,
    },
}

impl CheckoutStatus {
    /// Whether the attempt has finished.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }

    /// The error message, in the error state.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

impl std::fmt::Debug for CheckoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => f.write_str("Loading"),
            Self::Success { order_id, .. } => f
                .debug_struct("Success")
                .field("order_id", order_id)
                .field("client_secret", &"[REDACTED]")
                .finish(),
            Self::Error { message } => f.debug_struct("Error").field("message", message).finish(),
        }
    }
}

/// State of the checkout page for one reserved seat set.
#[derive(Debug)]
pub struct CheckoutPage {
    route: CheckoutRoute,
    status: CheckoutStatus,
}

impl CheckoutPage {
    #[must_use]
    pub const fn new(route: CheckoutRoute) -> Self {
        Self {
            route,
            status: CheckoutStatus::Loading,
        }
    }

    #[must_use]
    pub const fn route(&self) -> &CheckoutRoute {
        &self.route
    }

    #[must_use]
    pub const fn status(&self) -> &CheckoutStatus {
        &self.status
    }

    /// Link back to seat selection, offered once checkout has failed.
    #[must_use]
    pub fn back_link(&self) -> Option<String> {
        match self.status {
            CheckoutStatus::Error { .. } => Some(seat_selection_path(&self.route.event_id)),
            _ => None,
        }
    }

    /// Request the payment intent for `user`.
    ///
    /// Runs at most once; a page that has already reached a terminal state is
    /// returned as is. Missing preconditions fail without a network call.
    #[instrument(skip_all, fields(event_id = %self.route.event_id))]
    pub async fn run(&mut self, api: &ApiClient, user: Option<&User>) -> &CheckoutStatus {
        if self.status.is_terminal() {
            return &self.status;
        }

        let Some(user) = user else {
            return self.fail(MISSING_PRECONDITIONS_MESSAGE);
        };
        if self.route.event_id.is_empty() {
            return self.fail(MISSING_PRECONDITIONS_MESSAGE);
        }
        // No tier selection yet; the first seat stands in for the tier
        let Some(tier_id) = self.route.seat_ids.first().map(ToString::to_string) else {
            return self.fail(MISSING_PRECONDITIONS_MESSAGE);
        };

        let request = CheckoutRequest {
            user_id: user.id.clone(),
            event_id: self.route.event_id.clone(),
            seat_ids: self.route.seat_ids.clone(),
            tier_id,
            email: user.email.clone(),
        };

        add_breadcrumb(
            "checkout",
            "Checkout submitted",
            Some(&[("event_id", self.route.event_id.as_str())]),
        );

        self.status = match api.checkout(&request).await {
            Ok(response) => match response.client_secret.filter(|s| !s.is_empty()) {
                Some(secret) => {
                    info!(order_id = %response.order_id, "Payment intent created");
                    CheckoutStatus::Success {
                        order_id: response.order_id,
                        client_secret: SecretString::from(secret),
                    }
                }
                None => {
                    warn!(order_id = %response.order_id, "Checkout returned no payment intent");
                    CheckoutStatus::Error {
                        message: NO_PAYMENT_INTENT_MESSAGE.to_string(),
                    }
                }
            },
            Err(e) => {
                let message = failure_message(&e);
                warn!(error = %message, "Checkout failed");
                CheckoutStatus::Error { message }
            }
        };

        &self.status
    }

    fn fail(&mut self, message: &str) -> &CheckoutStatus {
        warn!(reason = message, "Checkout preconditions not met");
        self.status = CheckoutStatus::Error {
            message: message.to_string(),
        };
        &self.status
    }
}

/// Readable message for a failed checkout call.
fn failure_message(err: &ApiError) -> String {
    let message = err.message();
    if message.trim().is_empty() {
        CHECKOUT_FAILED_MESSAGE.to_string()
    } else {
        message
    }
}

/// The client secret of a successful checkout, for the payment handoff.
#[must_use]
pub fn client_secret(status: &CheckoutStatus) -> Option<&str> {
    match status {
        CheckoutStatus::Success { client_secret, .. } => Some(client_secret.expose_secret()),
        _ => None,
    }
}
