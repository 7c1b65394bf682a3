//! TicketFlow Core - Shared types library.
//!
//! This crate provides common types used across all TicketFlow components:
//! - `storefront` - Client library for the ticketing API (session, seats, checkout)
//! - `cli` - Command-line storefront
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! persistence, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and statuses
//! - [`input`] - Sanitizers for untrusted form input
//! - [`format`] - Display helpers for event dates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod format;
pub mod input;
pub mod types;

pub use types::*;
