//! In-memory test doubles for service tests.

mod mock_repository;

pub use mock_repository::MockProviderRepository;
