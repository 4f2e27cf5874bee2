//! Validation modules

pub mod driver;

pub use driver::{driver_spec, validate_configuration, DriverSpec, DRIVER_REGISTRY};
