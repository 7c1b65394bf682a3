//! Reservation and checkout commands.

use ticketflow_core::{EventId, SeatId};
use ticketflow_storefront::Storefront;
use ticketflow_storefront::checkout::{CheckoutRoute, CheckoutStatus};
use ticketflow_storefront::error::StorefrontError;
use ticketflow_storefront::seats::{LoadState, ReserveOutcome};

/// Reserve seats for the signed-in user.
///
/// Seats that are not available are skipped, like clicks on a taken seat.
///
/// # Errors
///
/// Returns an error if the viewer is signed out, nothing could be selected,
/// or the reservation is refused.
#[allow(clippy::print_stdout)]
pub async fn reserve(
    storefront: &Storefront,
    event_id: &str,
    seat_ids: &[String],
) -> Result<(), StorefrontError> {
    if !storefront.session().snapshot().await.is_authenticated() {
        return Err(StorefrontError::NotAuthenticated);
    }

    let mut page = storefront.seat_page(EventId::new(event_id)).await;
    if let LoadState::Failed(message) = page.state() {
        return Err(StorefrontError::Flow(message.clone()));
    }

    for id in seat_ids {
        let id = SeatId::new(id.as_str());
        if !page.toggle(&id) {
            println!("Skipping {id}: not available");
        }
    }

    match page.reserve(storefront.api(), storefront.session()).await {
        ReserveOutcome::Reserved(route) => {
            println!("Reserved {} seat(s).", route.seat_ids.len());
            println!("Continue at {}", route.path());
            println!(
                "    ticketflow checkout {} --seats {}",
                route.event_id,
                route
                    .seat_ids
                    .iter()
                    .map(SeatId::as_str)
                    .collect::<Vec<_>>()
                    .join(",")
            );
            Ok(())
        }
        ReserveOutcome::Failed(message) => Err(StorefrontError::Flow(message)),
        ReserveOutcome::Skipped => Err(StorefrontError::Flow(
            "No available seats selected.".to_string(),
        )),
    }
}

/// Create the order and payment intent for reserved seats.
///
/// # Errors
///
/// Returns an error if checkout ends in its error state.
#[allow(clippy::print_stdout)]
pub async fn checkout(
    storefront: &Storefront,
    event_id: &str,
    seats: &str,
) -> Result<(), StorefrontError> {
    let route = CheckoutRoute::from_query(EventId::new(event_id), Some(seats));
    let page = storefront.checkout(route).await;

    match page.status() {
        CheckoutStatus::Success { order_id, .. } => {
            println!("Order {order_id} created.");
            println!("Payment intent ready; complete payment to confirm your seats.");
            Ok(())
        }
        CheckoutStatus::Error { message } => {
            let back = page.back_link().unwrap_or_default();
            Err(StorefrontError::Flow(format!(
                "{message}\nBack to seat selection: {back}"
            )))
        }
        CheckoutStatus::Loading => Ok(()),
    }
}
