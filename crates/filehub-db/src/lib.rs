//! Filehub Database Layer
//!
//! Repository for storage provider records. Configurations are ciphertext by
//! the time they reach this crate; encryption lives in filehub-core and
//! orchestration in filehub-services.

pub mod provider;

pub use provider::{
    NewProvider, PgProviderRepository, ProviderChanges, ProviderRepository, ProviderRow,
};
