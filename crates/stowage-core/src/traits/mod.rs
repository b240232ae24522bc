//! Capability traits defined here in `stowage-core` and implemented by
//! the infrastructure crates.

pub mod object_store;

pub use object_store::{ByteStream, ListPrefixRequest, ObjectMeta, ObjectPage, ObjectStore};
