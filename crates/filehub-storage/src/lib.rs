//! Filehub Storage Library
//!
//! This crate provides the storage abstraction and backend implementations
//! for filehub: the [`StorageAdapter`] trait, adapters for S3-compatible
//! buckets, Google Cloud Storage, and the local filesystem, and the factory
//! that builds an adapter from a provider's decrypted configuration.
//!
//! # Object paths
//!
//! Paths are backend-relative and `/`-separated with no leading slash; the
//! empty string is the location root. Paths must not contain `..`. When a
//! provider configuration carries a key prefix, the adapter roots every path
//! under it and strips it from listing results, so callers never see the
//! prefix. See the `paths` module.

pub mod factory;
#[cfg(feature = "storage-google")]
pub mod gcs;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(any(feature = "storage-s3", feature = "storage-google"))]
pub(crate) mod multipart;
pub(crate) mod paths;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::build_adapter;
pub use filehub_core::StorageDriver;
#[cfg(feature = "storage-google")]
pub use gcs::GcsAdapter;
#[cfg(feature = "storage-local")]
pub use local::LocalAdapter;
#[cfg(feature = "storage-s3")]
pub use s3::S3Adapter;
pub use traits::{
    ByteStream, EntryKind, ObjectEntry, ObjectMetadata, StorageAdapter, StorageError,
    StorageResult, UploadReader,
};
