//! Core type definitions used across the Stowage workspace.

pub mod pagination;
pub mod sorting;

pub use pagination::{ListRange, Page};
pub use sorting::SortDirection;
