//! # stowage-service
//!
//! Business logic service layer for Stowage. Each service orchestrates
//! the metadata stores and the object-store gateway to implement
//! application-level use cases.
//!
//! Services follow constructor injection — all dependencies are provided
//! at construction time via `Arc` references, never module-level state.

pub mod context;
pub mod file;
pub mod folder;
pub mod share;

pub use context::RequestContext;
pub use file::FileService;
pub use folder::FolderService;
pub use share::{ShareAccessService, ShareService};
