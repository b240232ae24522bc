//! Share grant lifecycle and token-based access evaluation.

pub mod access;
pub mod service;
pub mod token;

pub use access::{
    FolderDownload, PresignedFile, ResolvedShare, ShareAccessService, ShareDownload,
    ShareDownloadRequest, SharedItem,
};
pub use service::{CreateShareRequest, CreatedShare, ShareService, UpdateShareRequest};
