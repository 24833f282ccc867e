//! Resolves a provider name to a virtual API key without ever handing the
//! raw secret to router logic — callers that need the key pass it straight
//! through to a `Provider` binding's own client construction.

use std::collections::HashMap;
use std::sync::Arc;
use strata_secrets::{SecretValue, SecretsStore};
use tokio::sync::RwLock;

/// A resolved credential for one provider, kept behind the same
/// scoped-access API as [`strata_secrets::SecretValue`].
pub struct VirtualKey(SecretValue);

impl VirtualKey {
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        self.0.with_bytes(f)
    }

    pub fn to_string_lossy(&self) -> Option<String> {
        self.0.to_string_lossy()
    }
}

impl std::fmt::Debug for VirtualKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("VirtualKey").field(&"[REDACTED]").finish()
    }
}

/// Resolves `"{PROVIDER}_VIRTUAL_KEY"`-style secret names, matching the
/// original's virtual-key-per-provider naming, caching each lookup for
/// process lifetime so the vault is never decrypted twice for the same key.
pub struct VirtualKeyStore<S: SecretsStore> {
    secrets: Arc<S>,
    cache: RwLock<HashMap<String, Arc<VirtualKey>>>,
}

impl<S: SecretsStore> VirtualKeyStore<S> {
    pub fn new(secrets: Arc<S>) -> Self {
        Self {
            secrets,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn secret_name(provider: &str) -> String {
        format!("{}_VIRTUAL_KEY", provider.to_uppercase())
    }

    pub async fn resolve(&self, provider: &str) -> Option<Arc<VirtualKey>> {
        let name = Self::secret_name(provider);
        if let Some(cached) = self.cache.read().await.get(&name) {
            return Some(cached.clone());
        }
        let value = self.secrets.get(&name, None).await?;
        let key = Arc::new(VirtualKey(value));
        self.cache.write().await.insert(name, key.clone());
        Some(key)
    }
}
