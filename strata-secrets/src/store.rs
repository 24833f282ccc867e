//! The [`SecretsStore`] trait: the contract every connector, provider
//! router, and orchestrator depends on, independent of the concrete
//! backend (encrypted vault, env-only test double, …).

use crate::error::SecretsError;
use crate::value::SecretValue;
use async_trait::async_trait;
use std::collections::HashMap;

/// Canonical suffixes assembled into an [`IntegrationCredentials`] bundle by
/// [`SecretsStore::get_integration`]. Order matches the original source's
/// `get_integration_credentials` pattern map.
pub const INTEGRATION_SUFFIXES: &[(&str, &str)] = &[
    ("api_key", "_API_KEY"),
    ("api_secret", "_API_SECRET"),
    ("access_token", "_ACCESS_TOKEN"),
    ("refresh_token", "_REFRESH_TOKEN"),
    ("client_id", "_CLIENT_ID"),
    ("client_secret", "_CLIENT_SECRET"),
    ("webhook_secret", "_WEBHOOK_SECRET"),
    ("base_url", "_BASE_URL"),
];

/// A credential bundle for one named integration (e.g. "gong", "netsuite").
/// Keys absent from the store are simply omitted from the map, matching the
/// source's "omitted keys map to absent fields" contract.
#[derive(Default)]
pub struct IntegrationCredentials {
    fields: HashMap<&'static str, SecretValue>,
}

impl IntegrationCredentials {
    pub fn get(&self, field: &str) -> Option<&SecretValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}

impl std::fmt::Debug for IntegrationCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrationCredentials")
            .field("fields_present", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Supplies credentials to every other `strata-*` component by logical
/// name, without leaking raw values to logs or stack traces.
///
/// Lookup order for [`get`](SecretsStore::get): process environment →
/// in-memory cache → on-disk encrypted vault → caller-supplied default. The
/// first hit wins and populates the cache.
#[async_trait]
pub trait SecretsStore: Send + Sync {
    /// Look up a secret by name, falling back through env/cache/vault/default.
    async fn get(&self, name: &str, default: Option<&str>) -> Option<SecretValue>;

    /// Store a secret in the vault (full re-encryption of the map) and
    /// update the cache.
    async fn set(&self, name: &str, value: SecretValue) -> Result<(), SecretsError>;

    /// Remove a secret from the vault and cache. No error if absent.
    async fn delete(&self, name: &str) -> Result<bool, SecretsError>;

    /// Key names only, never values.
    async fn list(&self) -> Result<Vec<String>, SecretsError>;

    /// Rotate a secret: functionally `set`, but emits an audit record
    /// (actor, host, timestamp) with the value redacted.
    async fn rotate(&self, name: &str, new_value: SecretValue) -> Result<(), SecretsError>;

    /// `name → bool` availability for every entry in `required`.
    async fn validate(&self, required: &[&str]) -> HashMap<String, bool> {
        let mut status = HashMap::with_capacity(required.len());
        let mut missing = Vec::new();
        for &key in required {
            let present = self.get(key, None).await.is_some();
            status.insert(key.to_string(), present);
            if !present {
                missing.push(key);
            }
        }
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "missing required secrets");
        }
        status
    }

    /// Assemble a credential bundle for `integration` from the canonical
    /// suffix set, upper-casing the integration name as the env-var prefix.
    async fn get_integration(&self, integration: &str) -> IntegrationCredentials {
        let prefix = integration.to_uppercase();
        let mut fields = HashMap::new();
        for (field, suffix) in INTEGRATION_SUFFIXES {
            let env_var = format!("{prefix}{suffix}");
            if let Some(value) = self.get(&env_var, None).await {
                fields.insert(*field, value);
            }
        }
        IntegrationCredentials { fields }
    }
}
