//! Seat selection for one event.
//!
//! [`SeatPage`] holds what a seat picker shows: the event, its seats, the
//! in-progress selection and the reservation state. Seat status is owned by
//! the server; the page only reads it.
//!
//! Loads are tagged with a generation. Navigating to another event bumps the
//! generation, so a load that finishes after the user moved on is dropped
//! instead of overwriting the newer page.

use tracing::{debug, info, instrument, warn};

use ticketflow_core::{EventId, SeatId, SeatStatus};

use crate::api::{
    ApiClient, ApiError, BearerToken, Event, ReservationRequest, ReservationResponse, Seat,
};
use crate::checkout::CheckoutRoute;
use crate::error::add_breadcrumb;
use crate::session::{Session, SessionStore};

/// Fetch an event and its seats concurrently. Both must succeed.
///
/// # Errors
///
/// Returns the first [`ApiError`] from either request.
#[instrument(skip_all, fields(event_id = %event_id))]
pub async fn load_event_seats(
    api: &ApiClient,
    event_id: &EventId,
) -> Result<(Event, Vec<Seat>), ApiError> {
    tokio::try_join!(api.get_event(event_id), api.event_seats(event_id))
}

// =============================================================================
// Page state
// =============================================================================

/// Progress of the event and seat load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    /// The load failed; the message is shown in place of the seat map.
    Failed(String),
    Ready { event: Event, seats: Vec<Seat> },
}

/// Identifies one load so its result can be matched to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub event_id: EventId,
    generation: u64,
}

/// Available seats sharing a section, in first-seen order.
#[derive(Debug, PartialEq, Eq)]
pub struct SectionGroup<'a> {
    pub section: &'a str,
    pub seats: Vec<&'a Seat>,
}

/// A reservation that has been submitted and not yet answered.
#[derive(Debug)]
pub struct PendingReservation {
    pub request: ReservationRequest,
    pub token: BearerToken,
}

/// Result of a reservation submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Preconditions were not met; nothing was sent.
    Skipped,
    /// Seats are held; continue to checkout.
    Reserved(CheckoutRoute),
    /// The service refused or could not be reached.
    Failed(String),
}

/// Seat picker state for one event.
#[derive(Debug)]
pub struct SeatPage {
    event_id: EventId,
    generation: u64,
    state: LoadState,
    selection: Vec<SeatId>,
    reserving: bool,
    error: Option<String>,
}

impl SeatPage {
    /// A page for `event_id`, not yet loaded.
    #[must_use]
    pub const fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            generation: 0,
            state: LoadState::Loading,
            selection: Vec::new(),
            reserving: false,
            error: None,
        }
    }

    #[must_use]
    pub const fn event_id(&self) -> &EventId {
        &self.event_id
    }

    #[must_use]
    pub const fn state(&self) -> &LoadState {
        &self.state
    }

    /// The loaded event, if any.
    #[must_use]
    pub const fn event(&self) -> Option<&Event> {
        match &self.state {
            LoadState::Ready { event, .. } => Some(event),
            _ => None,
        }
    }

    /// Every loaded seat, whatever its status.
    #[must_use]
    pub fn seats(&self) -> &[Seat] {
        match &self.state {
            LoadState::Ready { seats, .. } => seats,
            _ => &[],
        }
    }

    /// Selected seat ids in the order they were picked.
    #[must_use]
    pub fn selection(&self) -> &[SeatId] {
        &self.selection
    }

    #[must_use]
    pub fn is_selected(&self, seat_id: &SeatId) -> bool {
        self.selection.contains(seat_id)
    }

    /// Whether a reservation is in flight.
    #[must_use]
    pub const fn is_reserving(&self) -> bool {
        self.reserving
    }

    /// Message from the last failed reservation.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Switch the page to another event, dropping selection and errors.
    ///
    /// Any load started before this call becomes stale.
    pub fn navigate(&mut self, event_id: EventId) -> LoadTicket {
        self.event_id = event_id;
        self.begin_load()
    }

    /// Start a fresh load of the current event.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.state = LoadState::Loading;
        self.selection.clear();
        self.error = None;
        LoadTicket {
            event_id: self.event_id.clone(),
            generation: self.generation,
        }
    }

    /// Apply a finished load. Returns `false` if `ticket` is stale and the
    /// result was dropped.
    pub fn apply_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<(Event, Vec<Seat>), ApiError>,
    ) -> bool {
        if ticket.generation != self.generation || ticket.event_id != self.event_id {
            debug!(event_id = %ticket.event_id, "Dropping stale seat load");
            return false;
        }

        self.state = match result {
            Ok((event, seats)) => {
                debug!(event_id = %self.event_id, seats = seats.len(), "Seats loaded");
                LoadState::Ready { event, seats }
            }
            Err(e) => {
                warn!(event_id = %self.event_id, error = %e, "Seat load failed");
                LoadState::Failed(e.message())
            }
        };
        true
    }

    /// Load the current event and its seats.
    pub async fn load(&mut self, api: &ApiClient) {
        let ticket = self.begin_load();
        let result = load_event_seats(api, &ticket.event_id).await;
        self.apply_load(&ticket, result);
    }

    // =========================================================================
    // Presentation
    // =========================================================================

    /// Available seats grouped by section.
    #[must_use]
    pub fn available_by_section(&self) -> Vec<SectionGroup<'_>> {
        let mut groups: Vec<SectionGroup<'_>> = Vec::new();
        for seat in self.seats().iter().filter(|s| s.status.is_selectable()) {
            match groups.iter_mut().find(|g| g.section == seat.section) {
                Some(group) => group.seats.push(seat),
                None => groups.push(SectionGroup {
                    section: &seat.section,
                    seats: vec![seat],
                }),
            }
        }
        groups
    }

    /// Whether any seat is reserved or sold, so a legend is needed.
    #[must_use]
    pub fn show_legend(&self) -> bool {
        self.seats()
            .iter()
            .any(|s| matches!(s.status, SeatStatus::Reserved | SeatStatus::Sold))
    }

    /// Whether the viewer has to sign in before picking seats.
    #[must_use]
    pub const fn needs_login(session: &Session) -> bool {
        session.is_ready() && !session.is_authenticated()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Flip a seat in or out of the selection.
    ///
    /// Seats that are unknown or not available are ignored. Returns whether
    /// the selection changed.
    pub fn toggle(&mut self, seat_id: &SeatId) -> bool {
        let selectable = self
            .seats()
            .iter()
            .any(|s| &s.id == seat_id && s.status.is_selectable());
        if !selectable {
            return false;
        }

        if let Some(pos) = self.selection.iter().position(|id| id == seat_id) {
            self.selection.remove(pos);
        } else {
            self.selection.push(seat_id.clone());
        }
        true
    }

    // =========================================================================
    // Reservation
    // =========================================================================

    /// Start a reservation for the current selection.
    ///
    /// Returns `None`, leaving the page untouched, when the selection is
    /// empty, the session is not authenticated, the event id is unknown, or
    /// a reservation is already in flight.
    pub fn begin_reservation(&mut self, session: &Session) -> Option<PendingReservation> {
        if self.reserving || self.selection.is_empty() || self.event_id.is_empty() {
            return None;
        }
        let (_, token) = session.authenticated()?;

        self.reserving = true;
        self.error = None;
        Some(PendingReservation {
            request: ReservationRequest {
                event_id: self.event_id.clone(),
                seat_ids: self.selection.clone(),
            },
            token: token.clone(),
        })
    }

    /// Record the answer to a reservation started with
    /// [`Self::begin_reservation`].
    pub fn finish_reservation(
        &mut self,
        pending: PendingReservation,
        result: Result<ReservationResponse, ApiError>,
    ) -> ReserveOutcome {
        self.reserving = false;
        let PendingReservation { request, .. } = pending;

        match result {
            Ok(response) => {
                info!(
                    event_id = %request.event_id,
                    seats = response.seats.len(),
                    "Seats reserved"
                );
                add_breadcrumb(
                    "seats",
                    "Seats reserved",
                    Some(&[("event_id", request.event_id.as_str())]),
                );
                self.selection.clear();
                ReserveOutcome::Reserved(CheckoutRoute::new(request.event_id, request.seat_ids))
            }
            Err(e) => {
                let message = e.message();
                warn!(event_id = %request.event_id, error = %message, "Reservation failed");
                self.error = Some(message.clone());
                ReserveOutcome::Failed(message)
            }
        }
    }

    /// Reserve the selected seats for the signed-in user.
    pub async fn reserve(&mut self, api: &ApiClient, session: &SessionStore) -> ReserveOutcome {
        let snapshot = session.snapshot().await;
        let Some(pending) = self.begin_reservation(&snapshot) else {
            debug!(event_id = %self.event_id, "Reservation skipped");
            return ReserveOutcome::Skipped;
        };

        let result = api
            .create_reservation(&pending.request, &pending.token)
            .await;
        self.finish_reservation(pending, result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::session::MemoryStorage;

    use super::*;

    const ALICE_RECORD: &str =
        r#"{"token":"jwt","user":{"id":"1","email":"alice@example.com","name":"Alice","role":"user"}}"#;

    fn event(id: &str) -> Event {
        Event {
            id: EventId::new(id),
            name: "Jazz Night".to_string(),
            description: None,
            image_url: None,
            start_date: Utc.with_ymd_and_hms(2025, 6, 15, 19, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 6, 15, 22, 0, 0).unwrap(),
            organizer_id: None,
            venue_id: None,
            status: None,
            is_published: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn seat(id: &str, section: &str, status: SeatStatus) -> Seat {
        Seat {
            id: SeatId::new(id),
            section: section.to_string(),
            row: None,
            seat_number: None,
            status,
        }
    }

    fn loaded_page(seats: Vec<Seat>) -> SeatPage {
        let mut page = SeatPage::new(EventId::new("evt_1"));
        let ticket = page.begin_load();
        assert!(page.apply_load(&ticket, Ok((event("evt_1"), seats))));
        page
    }

    async fn signed_in_store(api: ApiClient) -> SessionStore {
        let store = SessionStore::new(api, Arc::new(MemoryStorage::with_record(ALICE_RECORD)));
        store.restore().await;
        store
    }

    fn api_for(server: &MockServer) -> ApiClient {
        ApiClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_groups_available_seats_by_first_seen_section() {
        let page = loaded_page(vec![
            seat("b1", "B", SeatStatus::Available),
            seat("a1", "A", SeatStatus::Available),
            seat("b2", "B", SeatStatus::Sold),
            seat("b3", "B", SeatStatus::Available),
            seat("c1", "C", SeatStatus::Reserved),
        ]);

        let groups = page.available_by_section();
        let summary: Vec<(&str, Vec<&str>)> = groups
            .iter()
            .map(|g| (g.section, g.seats.iter().map(|s| s.id.as_str()).collect()))
            .collect();
        assert_eq!(summary, vec![("B", vec!["b1", "b3"]), ("A", vec!["a1"])]);
        assert!(page.show_legend());
    }

    #[test]
    fn test_no_legend_when_everything_available() {
        let page = loaded_page(vec![seat("a1", "A", SeatStatus::Available)]);
        assert!(!page.show_legend());
    }

    #[test]
    fn test_toggle_flips_available_seats_in_order() {
        let mut page = loaded_page(vec![
            seat("s1", "A", SeatStatus::Available),
            seat("s2", "A", SeatStatus::Available),
        ]);

        assert!(page.toggle(&SeatId::new("s2")));
        assert!(page.toggle(&SeatId::new("s1")));
        assert_eq!(page.selection(), &[SeatId::new("s2"), SeatId::new("s1")]);

        assert!(page.toggle(&SeatId::new("s2")));
        assert_eq!(page.selection(), &[SeatId::new("s1")]);
    }

    #[test]
    fn test_toggling_unavailable_seats_never_changes_selection() {
        let mut page = loaded_page(vec![
            seat("s1", "A", SeatStatus::Available),
            seat("r1", "A", SeatStatus::Reserved),
            seat("x1", "A", SeatStatus::Sold),
        ]);
        page.toggle(&SeatId::new("s1"));

        let sequence = ["r1", "x1", "r1", "missing", "x1", "x1", "r1"];
        for id in sequence {
            assert!(!page.toggle(&SeatId::new(id)));
            assert_eq!(page.selection(), &[SeatId::new("s1")]);
        }
    }

    #[test]
    fn test_stale_load_is_dropped() {
        let mut page = SeatPage::new(EventId::new("evt_1"));
        let first = page.begin_load();
        let second = page.navigate(EventId::new("evt_2"));

        assert!(!page.apply_load(&first, Ok((event("evt_1"), vec![]))));
        assert_eq!(page.state(), &LoadState::Loading);

        assert!(page.apply_load(&second, Ok((event("evt_2"), vec![]))));
        assert_eq!(page.event().unwrap().id.as_str(), "evt_2");
    }

    #[test]
    fn test_navigate_discards_selection() {
        let mut page = loaded_page(vec![seat("s1", "A", SeatStatus::Available)]);
        page.toggle(&SeatId::new("s1"));
        page.navigate(EventId::new("evt_2"));
        assert!(page.selection().is_empty());
        assert!(page.seats().is_empty());
    }

    #[test]
    fn test_failed_load_keeps_message() {
        let mut page = SeatPage::new(EventId::new("evt_1"));
        let ticket = page.begin_load();
        page.apply_load(
            &ticket,
            Err(ApiError::Protocol {
                status: 404,
                message: "Event not found".to_string(),
            }),
        );
        assert_eq!(page.state(), &LoadState::Failed("Event not found".to_string()));
        assert!(page.available_by_section().is_empty());
    }

    #[tokio::test]
    async fn test_needs_login() {
        let anonymous = SessionStore::new(
            ApiClient::new(Url::parse("http://127.0.0.1:9").unwrap(), Duration::from_secs(1)).unwrap(),
            MemoryStorage::new(),
        );
        assert!(!SeatPage::needs_login(&anonymous.snapshot().await));
        anonymous.restore().await;
        assert!(SeatPage::needs_login(&anonymous.snapshot().await));

        let signed_in = signed_in_store(
            ApiClient::new(Url::parse("http://127.0.0.1:9").unwrap(), Duration::from_secs(1)).unwrap(),
        )
        .await;
        assert!(!SeatPage::needs_login(&signed_in.snapshot().await));
    }

    #[tokio::test]
    async fn test_load_fetches_event_and_seats() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events/evt_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "evt_1",
                "name": "Jazz Night",
                "startDate": "2025-06-15T19:00:00Z",
                "endDate": "2025-06-15T22:00:00Z",
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/events/evt_1/seats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "s1", "section": "A", "status": "available"},
            ])))
            .mount(&server)
            .await;

        let mut page = SeatPage::new(EventId::new("evt_1"));
        page.load(&api_for(&server)).await;
        assert_eq!(page.event().unwrap().name, "Jazz Night");
        assert_eq!(page.seats().len(), 1);
    }

    #[tokio::test]
    async fn test_load_fails_when_either_request_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events/evt_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "evt_1",
                "name": "Jazz Night",
                "startDate": "2025-06-15T19:00:00Z",
                "endDate": "2025-06-15T22:00:00Z",
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/events/evt_1/seats"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut page = SeatPage::new(EventId::new("evt_1"));
        page.load(&api_for(&server)).await;
        assert_eq!(
            page.state(),
            &LoadState::Failed("Service Unavailable".to_string())
        );
    }

    #[tokio::test]
    async fn test_reserve_sends_selection_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/reservations"))
            .and(header("authorization", "Bearer jwt"))
            .and(body_json(json!({"eventId": "evt_1", "seatIds": ["s1"]})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "seats": [{"id": "s1", "section": "A", "status": "reserved"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let store = signed_in_store(api.clone()).await;
        let mut page = loaded_page(vec![
            seat("s1", "A", SeatStatus::Available),
            seat("s2", "A", SeatStatus::Available),
        ]);
        page.toggle(&SeatId::new("s1"));

        let outcome = page.reserve(&api, &store).await;
        let ReserveOutcome::Reserved(route) = outcome else {
            panic!("expected reservation, got {outcome:?}");
        };
        assert_eq!(route.path(), "/events/evt_1/checkout?seatIds=s1");
        assert!(page.selection().is_empty());
        assert!(!page.is_reserving());
    }

    #[tokio::test]
    async fn test_reserve_failure_keeps_selection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/reservations"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"message": "Seat s1 is taken"})),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        let store = signed_in_store(api.clone()).await;
        let mut page = loaded_page(vec![seat("s1", "A", SeatStatus::Available)]);
        page.toggle(&SeatId::new("s1"));

        let outcome = page.reserve(&api, &store).await;
        assert_eq!(outcome, ReserveOutcome::Failed("Seat s1 is taken".to_string()));
        assert_eq!(page.error(), Some("Seat s1 is taken"));
        assert_eq!(page.selection(), &[SeatId::new("s1")]);
    }

    #[tokio::test]
    async fn test_reserve_preconditions_skip_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"seats": []})))
            .expect(0)
            .mount(&server)
            .await;
        let api = api_for(&server);

        // Empty selection
        let store = signed_in_store(api.clone()).await;
        let mut page = loaded_page(vec![seat("s1", "A", SeatStatus::Available)]);
        assert_eq!(page.reserve(&api, &store).await, ReserveOutcome::Skipped);

        // Anonymous session
        let anonymous = SessionStore::new(api.clone(), MemoryStorage::new());
        anonymous.restore().await;
        page.toggle(&SeatId::new("s1"));
        assert_eq!(page.reserve(&api, &anonymous).await, ReserveOutcome::Skipped);
        assert_eq!(page.selection(), &[SeatId::new("s1")]);
    }

    #[tokio::test]
    async fn test_second_submit_while_reserving_is_rejected() {
        let store = signed_in_store(
            ApiClient::new(Url::parse("http://127.0.0.1:9").unwrap(), Duration::from_secs(1)).unwrap(),
        )
        .await;
        let session = store.snapshot().await;

        let mut page = loaded_page(vec![seat("s1", "A", SeatStatus::Available)]);
        page.toggle(&SeatId::new("s1"));

        let pending = page.begin_reservation(&session).unwrap();
        assert!(page.is_reserving());
        assert!(page.begin_reservation(&session).is_none());

        let outcome = page.finish_reservation(pending, Ok(ReservationResponse { seats: vec![] }));
        assert!(matches!(outcome, ReserveOutcome::Reserved(_)));
        assert!(!page.is_reserving());
    }
}
