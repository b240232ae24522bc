//! Folder hierarchy management.

pub mod service;

pub use service::{CreateFolderRequest, FolderService, SubtreeDeletion};
