//! Browsing commands: health, events, seats.

use ticketflow_core::EventId;
use ticketflow_core::format::format_date_range;
use ticketflow_storefront::Storefront;
use ticketflow_storefront::api::Event;
use ticketflow_storefront::catalog::{self, CatalogView};
use ticketflow_storefront::error::StorefrontError;
use ticketflow_storefront::seats::{LoadState, SeatPage};

/// Check the ticketing API answers.
///
/// # Errors
///
/// Returns an error if the service is unreachable or unhealthy.
#[allow(clippy::print_stdout)]
pub async fn health(storefront: &Storefront) -> Result<(), StorefrontError> {
    let status = storefront.api().health().await?;
    println!(
        "{}: {}",
        storefront.api().base_url(),
        status.status.as_deref().unwrap_or("ok")
    );
    Ok(())
}

/// List upcoming events.
///
/// # Errors
///
/// Returns an error if the listing could not be fetched.
#[allow(clippy::print_stdout)]
pub async fn list(storefront: &Storefront) -> Result<(), StorefrontError> {
    let view = catalog::load_catalog(storefront.api()).await;
    let hint = view.hint().unwrap_or_default();
    match view {
        CatalogView::Listing(events) => {
            println!("Upcoming events\n");
            for event in &events {
                print_summary(event);
            }
            Ok(())
        }
        CatalogView::Empty => {
            println!("No events yet.");
            Ok(())
        }
        CatalogView::Unavailable { message, .. } => {
            Err(StorefrontError::Flow(format!("{message}\n{hint}")))
        }
    }
}

#[allow(clippy::print_stdout)]
fn print_summary(event: &Event) {
    println!("{}  {}", event.id, event.name);
    println!("    {}", format_date_range(&event.start_date, &event.end_date));
    if let Some(description) = &event.description {
        println!("    {description}");
    }
    println!();
}

/// Show one event.
///
/// # Errors
///
/// Returns [`StorefrontError::NotFound`] if the event cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn show(storefront: &Storefront, id: &str) -> Result<(), StorefrontError> {
    let id = EventId::new(id);
    let event = catalog::load_event(storefront.api(), &id).await?;

    println!("{}", event.name);
    println!("{}", format_date_range(&event.start_date, &event.end_date));
    if let Some(description) = &event.description {
        println!("\n{description}");
    }
    println!("\nChoose seats: ticketflow seats {}", event.id);
    Ok(())
}

/// Print the seat map of an event.
///
/// # Errors
///
/// Returns an error if the viewer is signed out or the seats could not be
/// loaded.
#[allow(clippy::print_stdout)]
pub async fn seats(storefront: &Storefront, event_id: &str) -> Result<(), StorefrontError> {
    let session = storefront.session().snapshot().await;
    if SeatPage::needs_login(&session) {
        return Err(StorefrontError::NotAuthenticated);
    }

    let page = storefront.seat_page(EventId::new(event_id)).await;
    let event = match page.state() {
        LoadState::Ready { event, .. } => event,
        LoadState::Failed(message) => return Err(StorefrontError::Flow(message.clone())),
        LoadState::Loading => return Ok(()),
    };

    println!("{}", event.name);
    println!("{}\n", format_date_range(&event.start_date, &event.end_date));

    let groups = page.available_by_section();
    if groups.is_empty() {
        println!("No seats available.");
    }
    for group in groups {
        println!("Section {}", group.section);
        let labels: Vec<String> = group
            .seats
            .iter()
            .map(|seat| format!("{} [{}]", seat.label(), seat.id))
            .collect();
        println!("    {}", labels.join("  "));
    }

    if page.show_legend() {
        println!("\nReserved and sold seats are not shown.");
    }
    Ok(())
}
