use crate::domain::error::{AppError, Result};
use keyring::Entry;

/// Secrets stored in the OS credential store under one service name.
pub struct KeyringManager {
    service: String,
}

impl KeyringManager {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key)
            .map_err(|e| AppError::SecurityError(format!("Failed to open keyring entry: {}", e)))
    }

    pub fn set_secret(&self, key: &str, secret: &str) -> Result<()> {
        if secret.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Refusing to store an empty secret".to_string(),
            ));
        }
        self.entry(key)?
            .set_password(secret.trim())
            .map_err(|e| AppError::SecurityError(format!("Failed to store secret: {}", e)))
    }

    pub fn get_secret(&self, key: &str) -> Result<String> {
        self.entry(key)?.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => {
                AppError::NotFound(format!("No '{}' secret in the keyring", key))
            }
            other => AppError::SecurityError(format!("Failed to read secret: {}", other)),
        })
    }

    pub fn delete_secret(&self, key: &str) -> Result<()> {
        self.entry(key)?
            .delete_credential()
            .map_err(|e| AppError::SecurityError(format!("Failed to delete secret: {}", e)))
    }
}
