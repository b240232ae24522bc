//! # stowage-entity
//!
//! Domain entity models for Stowage. Each entity is a plain
//! data-transfer struct converted at the storage boundary; internal
//! logic never operates on loosely-typed maps.

pub mod file;
pub mod folder;
pub mod share;

pub use file::{CreateFileRecord, FileListing, FileQuery, FileRecord, FileSortField};
pub use folder::{CreateFolderNode, FolderNode};
pub use share::{CreateShareGrant, ShareGrant, SharePermission, SharedItemType};
