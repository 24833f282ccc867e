//! A plain env + in-memory-map [`SecretsStore`], with no on-disk vault and
//! no encryption — the test/embedding double, the way `neuron-secret-env`
//! sits alongside `neuron-secret-vault`.

use crate::error::SecretsError;
use crate::store::SecretsStore;
use crate::value::SecretValue;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Env var lookup backed by a plain in-memory map instead of an encrypted
/// vault. Useful for tests and for embedders that don't need persistence.
#[derive(Default)]
pub struct EnvOnlySecretsStore {
    map: RwLock<HashMap<String, Vec<u8>>>,
}

impl EnvOnlySecretsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretsStore for EnvOnlySecretsStore {
    async fn get(&self, name: &str, default: Option<&str>) -> Option<SecretValue> {
        if let Ok(env_value) = std::env::var(name) {
            if !env_value.is_empty() {
                return Some(SecretValue::from_string(env_value));
            }
        }
        if let Some(bytes) = self.map.read().await.get(name) {
            return Some(SecretValue::new(bytes.clone()));
        }
        default.map(SecretValue::from_string)
    }

    async fn set(&self, name: &str, value: SecretValue) -> Result<(), SecretsError> {
        let bytes = value.with_bytes(|b| b.to_vec());
        self.map.write().await.insert(name.to_string(), bytes);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool, SecretsError> {
        Ok(self.map.write().await.remove(name).is_some())
    }

    async fn list(&self) -> Result<Vec<String>, SecretsError> {
        Ok(self.map.read().await.keys().cloned().collect())
    }

    async fn rotate(&self, name: &str, new_value: SecretValue) -> Result<(), SecretsError> {
        self.set(name, new_value).await
    }
}
