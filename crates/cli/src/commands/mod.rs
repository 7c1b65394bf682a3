//! Subcommand implementations.

pub mod auth;
pub mod events;
pub mod orders;
