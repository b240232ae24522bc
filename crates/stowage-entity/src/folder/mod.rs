//! Folder entity.

pub mod model;

pub use model::{CreateFolderNode, FolderNode};
