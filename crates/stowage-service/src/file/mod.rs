//! File record management.

pub mod service;

pub use service::{
    DeleteOutcome, FileService, PresignedDownload, PresignedUpload, PresignedUploadRequest,
    UpdateMetadataRequest, UploadRequest,
};
