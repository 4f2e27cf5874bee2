//! Filehub Services Library
//!
//! Orchestration layer between the storage adapters, the provider
//! repository, and callers: the provider service (lifecycle of encrypted
//! provider configurations), the file manager facade (file operations
//! against the selected provider), and the connection tester.

pub mod connection;
pub mod file_manager;
pub mod provider;
pub mod test_helpers;

pub use connection::ConnectionTester;
pub use file_manager::{Download, FileManager, UploadOptions, UploadSource};
pub use provider::ProviderService;
