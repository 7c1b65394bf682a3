//! Unified error handling with Sentry integration.
//!
//! Each component has its own error type ([`ApiError`], [`SessionError`],
//! [`ConfigError`]). [`StorefrontError`] unifies them for callers that drive
//! several flows, such as the CLI, and knows which failures are worth a Sentry
//! event.

use thiserror::Error;

use ticketflow_core::input::InputError;

use crate::api::{ApiError, ApiErrorKind};
use crate::config::ConfigError;
use crate::session::SessionError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Ticketing API call failed.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Session operation failed.
    #[error("{0}")]
    Session(#[from] SessionError),

    /// Form input was rejected before reaching the network.
    #[error("{0}")]
    Input(#[from] InputError),

    /// The operation needs a signed-in user.
    #[error("Please log in first.")]
    NotAuthenticated,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A flow ended in its error state.
    #[error("{0}")]
    Flow(String),
}

impl StorefrontError {
    /// Whether this error indicates a fault worth reporting, as opposed to a
    /// user mistake or an expected business outcome.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Api(err) => matches!(
                err.kind(),
                ApiErrorKind::Transport | ApiErrorKind::Decode | ApiErrorKind::Request
            ),
            Self::Session(err) => err.is_reportable(),
            Self::Input(_) | Self::NotAuthenticated | Self::NotFound(_) | Self::Flow(_) => false,
        }
    }

    /// Capture the error to Sentry if it is reportable.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error. Never pass credential material as data.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("seats", "Reservation submitted", Some(&[("event_id", "evt_1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_user_facing() {
        let err = StorefrontError::from(ApiError::Protocol {
            status: 409,
            message: "Seat already reserved".to_string(),
        });
        assert_eq!(err.to_string(), "Seat already reserved");

        let err = StorefrontError::from(InputError::InvalidLogin);
        assert_eq!(err.to_string(), "Please enter a valid email and password.");
    }

    #[test]
    fn test_reportable_classification() {
        assert!(StorefrontError::from(ApiError::Transport("connection refused".into())).is_reportable());
        assert!(
            !StorefrontError::from(ApiError::Protocol {
                status: 401,
                message: "Invalid credentials".into()
            })
            .is_reportable()
        );
        assert!(!StorefrontError::NotAuthenticated.is_reportable());
        assert!(!StorefrontError::Flow("No payment intent returned.".into()).is_reportable());
    }

    #[test]
    fn test_sentry_helpers_without_client_are_noops() {
        set_sentry_user(&"1", Some("alice@example.com"));
        add_breadcrumb("test", "breadcrumb", Some(&[("k", "v")]));
        clear_sentry_user();
    }
}
