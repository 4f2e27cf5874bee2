//! Encryption service for provider configurations at rest.
//!
//! Uses AES-256-GCM authenticated encryption. There is no fallback: a
//! missing or malformed key is a hard failure, and a blob that fails to
//! decrypt or decode never yields a partially-usable configuration.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use std::env;

use crate::error::AppError;
use crate::models::ProviderConfiguration;

/// Encryption service for provider configuration blobs.
#[derive(Clone)]
pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl EncryptionService {
    /// Create a new encryption service from a raw 32-byte key (e.g. for
    /// tests; avoids env mutation).
    pub fn from_key_bytes(key_bytes: &[u8]) -> Result<Self, AppError> {
        if key_bytes.len() != 32 {
            return Err(AppError::Encryption(
                "Encryption key must be 32 bytes (256 bits)".to_string(),
            ));
        }
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Create a new encryption service from the environment.
    /// Expects ENCRYPTION_KEY to be a base64-encoded 32-byte key.
    pub fn new() -> Result<Self, AppError> {
        let key_str = env::var("ENCRYPTION_KEY").map_err(|_| {
            AppError::Encryption("ENCRYPTION_KEY environment variable not set".to_string())
        })?;

        let key_bytes = general_purpose::STANDARD
            .decode(&key_str)
            .map_err(|e| AppError::Encryption(format!("Failed to decode encryption key: {}", e)))?;

        Self::from_key_bytes(&key_bytes)
    }

    /// Encrypt a plaintext string. Output is base64(nonce || ciphertext).
    pub fn encrypt(&self, plaintext: &str) -> Result<String, AppError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| AppError::Encryption(format!("Encryption failed: {}", e)))?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(general_purpose::STANDARD.encode(&combined))
    }

    /// Decrypt a string produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, encrypted: &str) -> Result<String, AppError> {
        let combined = general_purpose::STANDARD
            .decode(encrypted)
            .map_err(|e| AppError::Encryption(format!("Failed to decode encrypted data: {}", e)))?;

        if combined.len() < 12 {
            return Err(AppError::Encryption("Encrypted data too short".to_string()));
        }

        // Nonce is the first 12 bytes, ciphertext the rest.
        let nonce = Nonce::from_slice(&combined[..12]);
        let ciphertext = &combined[12..];

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| AppError::Encryption(format!("Decryption failed: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|e| AppError::Encryption(format!("Invalid UTF-8 in decrypted data: {}", e)))
    }

    /// Serialize and encrypt a typed provider configuration.
    pub fn encrypt_configuration(
        &self,
        configuration: &ProviderConfiguration,
    ) -> Result<String, AppError> {
        let plaintext = serde_json::to_string(configuration).map_err(|e| {
            AppError::Encryption(format!("Failed to serialize configuration: {}", e))
        })?;
        self.encrypt(&plaintext)
    }

    /// Decrypt and decode a configuration blob through the typed model. A
    /// blob that decrypts but does not decode into a known driver shape is an
    /// error, never a raw value.
    pub fn decrypt_configuration(&self, encrypted: &str) -> Result<ProviderConfiguration, AppError> {
        let plaintext = self.decrypt(encrypted)?;
        serde_json::from_str(&plaintext)
            .map_err(|e| AppError::Encryption(format!("Failed to decode configuration: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> EncryptionService {
        let test_key = b"01234567890123456789012345678901";
        EncryptionService::from_key_bytes(test_key).unwrap()
    }

    #[test]
    fn test_encryption_decryption() {
        let service = test_service();
        let plaintext = "super_secret_access_key";

        let encrypted = service.encrypt(plaintext).unwrap();
        assert_ne!(encrypted, plaintext);

        let decrypted = service.decrypt(&encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_configuration_round_trip() {
        let service = test_service();
        let config = ProviderConfiguration::S3 {
            key: "AKIA123".to_string(),
            secret: "shh".to_string(),
            region: "eu-west-1".to_string(),
            bucket: "my-bucket".to_string(),
            prefix: Some("uploads".to_string()),
            endpoint: None,
        };

        let encrypted = service.encrypt_configuration(&config).unwrap();
        assert!(!encrypted.contains("AKIA123"));
        assert!(!encrypted.contains("shh"));

        let decrypted = service.decrypt_configuration(&encrypted).unwrap();
        match decrypted {
            ProviderConfiguration::S3 { key, bucket, prefix, .. } => {
                assert_eq!(key, "AKIA123");
                assert_eq!(bucket, "my-bucket");
                assert_eq!(prefix.as_deref(), Some("uploads"));
            }
            other => panic!("expected s3 configuration, got {:?}", other),
        }
    }

    #[test]
    fn test_tampered_blob_fails() {
        let service = test_service();
        let encrypted = service.encrypt("plaintext").unwrap();

        let mut combined = general_purpose::STANDARD.decode(&encrypted).unwrap();
        let last = combined.len() - 1;
        combined[last] ^= 0xff;
        let tampered = general_purpose::STANDARD.encode(&combined);

        assert!(service.decrypt(&tampered).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let service = test_service();
        let encrypted = service.encrypt("plaintext").unwrap();

        let other = EncryptionService::from_key_bytes(b"abcdefghijklmnopqrstuvwxyz012345").unwrap();
        assert!(other.decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_short_key_rejected() {
        assert!(EncryptionService::from_key_bytes(b"too-short").is_err());
    }
}
