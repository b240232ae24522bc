//! File entity.

pub mod model;
pub mod query;

pub use model::{CreateFileRecord, FileRecord};
pub use query::{FileListing, FileQuery, FileSortField};
