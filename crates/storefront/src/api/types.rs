//! Wire types for the ticketing API.
//!
//! Field names follow the API's camelCase JSON. Optional fields the API may
//! omit or null out are `Option`s.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use ticketflow_core::{Email, EventId, OrderId, SeatId, SeatStatus, UserId, UserRole};

use super::BearerToken;

// =============================================================================
// Accounts
// =============================================================================

/// An account as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    /// Display name.
    pub name: String,
    pub role: UserRole,
}

/// Body for `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a Email,
    #[serde(serialize_with = "serialize_secret")]
    pub password: &'a SecretString,
}

/// Body for `POST /auth/register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a Email,
    #[serde(serialize_with = "serialize_secret")]
    pub password: &'a SecretString,
    pub name: &'a str,
}

/// Successful login or registration.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: BearerToken,
    pub user: User,
}

fn serialize_secret<S: Serializer>(secret: &&SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

// =============================================================================
// Catalog
// =============================================================================

/// `GET /health` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthStatus {
    pub status: Option<String>,
}

/// A scheduled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub organizer_id: Option<String>,
    pub venue_id: Option<String>,
    pub status: Option<String>,
    pub is_published: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One seat of an event, with its server-reported availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: SeatId,
    pub section: String,
    pub row: Option<String>,
    pub seat_number: Option<u32>,
    pub status: SeatStatus,
}

impl Seat {
    /// Short label for a seat button: row and number, or an id prefix when
    /// the seat is unnumbered.
    #[must_use]
    pub fn label(&self) -> String {
        let row = self.row.as_deref().unwrap_or("");
        let number = self.seat_number.map_or_else(
            || self.id.as_str().chars().take(6).collect(),
            |n| n.to_string(),
        );
        format!("{row} {number}").trim_start().to_string()
    }
}

// =============================================================================
// Reservations & Orders
// =============================================================================

/// Body for `POST /reservations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub event_id: EventId,
    pub seat_ids: Vec<SeatId>,
}

/// Seats held by a successful reservation.
#[derive(Debug, Clone, Deserialize)]
pub struct ReservationResponse {
    pub seats: Vec<Seat>,
}

/// Body for `POST /orders/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_id: UserId,
    pub event_id: EventId,
    pub seat_ids: Vec<SeatId>,
    /// Pricing tier. The API has no tier selection yet, callers pass the
    /// first seat id.
    pub tier_id: String,
    pub email: Email,
}

/// Order created by checkout, with the payment intent's client secret.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for CheckoutResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutResponse")
            .field("order_id", &self.order_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_event_minimal_payload() {
        let event: Event = serde_json::from_value(json!({
            "id": "evt_1",
            "name": "Jazz Night",
            "description": null,
            "startDate": "2025-06-15T19:00:00.000Z",
            "endDate": "2025-06-15T22:00:00.000Z",
        }))
        .unwrap();
        assert_eq!(event.id.as_str(), "evt_1");
        assert!(event.description.is_none());
        assert!(event.image_url.is_none());
        assert!(event.is_published.is_none());
    }

    #[test]
    fn test_seat_payload() {
        let seat: Seat = serde_json::from_value(json!({
            "id": "s1", "section": "A", "row": "B", "seatNumber": 12, "status": "reserved"
        }))
        .unwrap();
        assert_eq!(seat.status, SeatStatus::Reserved);
        assert_eq!(seat.label(), "B 12");
    }

    #[test]
    fn test_unnumbered_seat_label_uses_id_prefix() {
        let seat: Seat = serde_json::from_value(json!({
            "id": "a1b2c3d4e5", "section": "GA", "row": null, "seatNumber": null, "status": "available"
        }))
        .unwrap();
        assert_eq!(seat.label(), "a1b2c3");
    }

    #[test]
    fn test_login_request_serializes_password() {
        let email = Email::parse("alice@example.com").unwrap();
        let password = SecretString::from("secret123");
        let body = serde_json::to_value(LoginRequest {
            email: &email,
            password: &password,
        })
        .unwrap();
        assert_eq!(body, json!({"email": "alice@example.com", "password": "secret123"}));
    }

    #[test]
    fn test_checkout_request_is_camel_case() {
        let body = serde_json::to_value(CheckoutRequest {
            user_id: UserId::new("1"),
            event_id: EventId::new("evt_1"),
            seat_ids: vec![SeatId::new("s1")],
            tier_id: "s1".to_string(),
            email: Email::parse("alice@example.com").unwrap(),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "userId": "1",
                "eventId": "evt_1",
                "seatIds": ["s1"],
                "tierId": "s1",
                "email": "alice@example.com",
            })
        );
    }

    #[test]
    fn test_checkout_response_debug_hides_secret() {
        let res: CheckoutResponse =
            serde_json::from_value(json!({"orderId": "ord_1", "clientSecret": "pi_secret"}))
                .unwrap();
        assert!(!format!("{res:?}").contains("pi_secret"));

        let res: CheckoutResponse =
            serde_json::from_value(json!({"orderId": "ord_2", "clientSecret": null})).unwrap();
        assert!(res.client_secret.is_none());
    }
}
