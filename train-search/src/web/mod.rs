//! Web layer for the train search service.
//!
//! Provides JSON endpoints for station autocomplete, train search and
//! train schedules.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, Engine};
