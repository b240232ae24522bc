//! # stowage-storage
//!
//! Object-store gateway for Stowage: the S3 provider, an in-memory
//! provider for tests and embedded use, and the key-layout rules that
//! map the logical folder hierarchy onto flat object keys.

pub mod keys;
pub mod providers;

pub use providers::memory::MemoryObjectStore;
pub use providers::s3::S3ObjectStore;
