//! Core types for eventboard.
//!
//! This crate provides what both the server and the CLI build on:
//! - `Event` and its `EventDate` / `EventTime` variants
//! - `validate` for turning untrusted input into a `NewEvent`
//! - `store` for persistence and the day-paginated query

pub mod config;
pub mod constants;
pub mod day_window;
pub mod error;
pub mod event;
pub mod store;
pub mod validate;

// Re-export the types every consumer needs at crate root
pub use error::{EventError, EventResult};
pub use event::*;
pub use store::{EventPage, EventStore};
pub use validate::{EventInput, FieldError, ValidationErrors};
