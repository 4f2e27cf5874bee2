use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage driver types
///
/// This enum defines the storage drivers a provider can be configured with.
/// It's defined in core because it's used in configuration, validation, and
/// the database layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "storage_driver", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    S3,
    Google,
    Local,
}

impl StorageDriver {
    /// All drivers known to this build, in registration order.
    pub const ALL: &'static [StorageDriver] =
        &[StorageDriver::S3, StorageDriver::Google, StorageDriver::Local];
}

impl FromStr for StorageDriver {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageDriver::S3),
            "google" => Ok(StorageDriver::Google),
            "local" => Ok(StorageDriver::Local),
            _ => Err(anyhow::anyhow!("Invalid storage driver: {}", s)),
        }
    }
}

impl Display for StorageDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageDriver::S3 => write!(f, "s3"),
            StorageDriver::Google => write!(f, "google"),
            StorageDriver::Local => write!(f, "local"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_display() {
        for driver in StorageDriver::ALL {
            let parsed: StorageDriver = driver.to_string().parse().unwrap();
            assert_eq!(parsed, *driver);
        }
    }

    #[test]
    fn unknown_driver_fails_to_parse() {
        assert!("ftp".parse::<StorageDriver>().is_err());
        assert!("".parse::<StorageDriver>().is_err());
    }
}
