//! # stowage-api
//!
//! Thin HTTP layer over the Stowage services. Identity arrives as
//! reverse-proxy-supplied headers (the auth layer lives in front of this
//! process); handlers translate requests into service calls and map
//! [`stowage_core::AppError`] onto HTTP statuses.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
