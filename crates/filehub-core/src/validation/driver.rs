//! Driver configuration validation.
//!
//! Each supported driver is registered here with its required configuration
//! fields. Adding a driver means adding a registry entry (and a
//! [`crate::models::ProviderConfiguration`] variant), not editing branching
//! logic spread across the codebase.

use std::str::FromStr;

use crate::error::{AppError, ValidationFailures};
use crate::storage_types::StorageDriver;

/// Registry entry for one driver: the configuration fields that must be
/// present and non-blank before a provider is considered valid.
#[derive(Debug, Clone, Copy)]
pub struct DriverSpec {
    pub driver: StorageDriver,
    pub required_fields: &'static [&'static str],
}

/// The driver registry. Validation and the adapter factory are both keyed by
/// the entries here.
pub const DRIVER_REGISTRY: &[DriverSpec] = &[
    DriverSpec {
        driver: StorageDriver::S3,
        required_fields: &["key", "secret", "region", "bucket"],
    },
    DriverSpec {
        driver: StorageDriver::Google,
        required_fields: &["project_id", "key_file", "bucket"],
    },
    DriverSpec {
        driver: StorageDriver::Local,
        required_fields: &["root"],
    },
];

/// Look up the registry entry for a driver.
pub fn driver_spec(driver: StorageDriver) -> &'static DriverSpec {
    DRIVER_REGISTRY
        .iter()
        .find(|spec| spec.driver == driver)
        .expect("every StorageDriver variant has a registry entry")
}

/// Validate a loose configuration object against the driver registry.
///
/// Returns the resolved driver on success. Every missing or blank required
/// field is reported in a single `Validation` error; an unknown driver string
/// is an `UnsupportedDriver` error, never a validation failure.
pub fn validate_configuration(configuration: &serde_json::Value) -> Result<StorageDriver, AppError> {
    let object = match configuration.as_object() {
        Some(object) => object,
        None => {
            return Err(AppError::validation_field(
                "configuration",
                "must be a JSON object",
            ))
        }
    };

    let driver_value = match object.get("driver").and_then(|v| v.as_str()) {
        Some(driver) if !driver.trim().is_empty() => driver,
        _ => return Err(AppError::validation_field("driver", "is required")),
    };

    let driver = StorageDriver::from_str(driver_value)
        .map_err(|_| AppError::UnsupportedDriver(driver_value.to_string()))?;

    let mut failures = ValidationFailures::new();
    for field in driver_spec(driver).required_fields {
        let present = object
            .get(*field)
            .and_then(|v| v.as_str())
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
        if !present {
            failures.add(*field, "is required");
        }
    }

    failures.into_result()?;
    Ok(driver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_driver_has_a_registry_entry() {
        for driver in StorageDriver::ALL {
            let spec = driver_spec(*driver);
            assert!(!spec.required_fields.is_empty());
        }
    }

    #[test]
    fn valid_s3_configuration_passes() {
        let config = serde_json::json!({
            "driver": "s3",
            "key": "AKIA123",
            "secret": "shh",
            "region": "eu-west-1",
            "bucket": "my-bucket"
        });
        assert_eq!(validate_configuration(&config).unwrap(), StorageDriver::S3);
    }

    #[test]
    fn missing_secret_is_named() {
        let config = serde_json::json!({
            "driver": "s3",
            "key": "AKIA123",
            "region": "eu-west-1",
            "bucket": "my-bucket"
        });
        match validate_configuration(&config) {
            Err(AppError::Validation(failures)) => {
                assert!(failures.names_field("secret"));
                assert_eq!(failures.violations.len(), 1);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn all_missing_fields_are_reported_together() {
        let config = serde_json::json!({ "driver": "s3" });
        match validate_configuration(&config) {
            Err(AppError::Validation(failures)) => {
                for field in ["key", "secret", "region", "bucket"] {
                    assert!(failures.names_field(field), "missing violation for {}", field);
                }
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn blank_fields_count_as_missing() {
        let config = serde_json::json!({
            "driver": "google",
            "project_id": "  ",
            "key_file": "/etc/gcs/key.json",
            "bucket": "archive"
        });
        match validate_configuration(&config) {
            Err(AppError::Validation(failures)) => {
                assert!(failures.names_field("project_id"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_driver_is_unsupported_not_validation() {
        let config = serde_json::json!({ "driver": "ftp", "host": "example.com" });
        match validate_configuration(&config) {
            Err(AppError::UnsupportedDriver(driver)) => assert_eq!(driver, "ftp"),
            other => panic!("expected unsupported driver error, got {:?}", other),
        }
    }

    #[test]
    fn missing_driver_is_validation_naming_driver() {
        let config = serde_json::json!({ "bucket": "my-bucket" });
        match validate_configuration(&config) {
            Err(AppError::Validation(failures)) => assert!(failures.names_field("driver")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn non_object_configuration_is_rejected() {
        let config = serde_json::json!("driver=s3");
        assert!(matches!(
            validate_configuration(&config),
            Err(AppError::Validation(_))
        ));
    }
}
