//! Contoso storage crate - local SQLite persistence.
//!
//! The assistant keeps conversations in memory only; the one thing that
//! survives a restart is whether a shopper's email has been confirmed.

pub mod confirmations;
pub mod db;
pub mod migrations;

pub use confirmations::{confirmation_key, ConfirmationRepository};
pub use db::Database;
