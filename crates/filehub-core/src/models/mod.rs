//! Domain models

pub mod entry;
pub mod provider;

pub use entry::{FileEntry, FileMetadata, FolderEntry, Listing, UploadResult, Visibility};
pub use provider::{
    CreateProviderRequest, OwnerContext, OwnerScope, ProviderConfiguration, ProviderRecord,
    StorageProvider, UpdateProviderRequest,
};
