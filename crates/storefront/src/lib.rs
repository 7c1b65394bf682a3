//! TicketFlow Storefront library.
//!
//! Client-side orchestration for the TicketFlow ticketing API: the request
//! gateway, the persisted session, seat selection and checkout. Rendering is
//! left to the caller (the `ticketflow` CLI is one such caller); every flow
//! exposes its progress as plain state that a view can display.
//!
//! # Modules
//!
//! - [`api`] - Request gateway and wire types for the ticketing API
//! - [`session`] - Authenticated session with durable persistence
//! - [`seats`] - Seat inventory, selection, and reservation
//! - [`checkout`] - Payment-intent checkout state machine
//! - [`catalog`] - Event listing and detail views
//! - [`logging`] - Tracing setup and secret redaction
//! - [`state`] - The [`Storefront`] context wiring everything together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod logging;
pub mod seats;
pub mod session;
pub mod state;

pub use state::Storefront;
