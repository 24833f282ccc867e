//! AES-256-GCM encrypted on-disk vault, env fallback, in-memory cache.
//!
//! Grounded in the source's `SecretsManager`: a per-user directory holding a
//! 32-byte key file and a single encrypted blob whose plaintext is a JSON
//! object `{name: value}`. The source uses `cryptography.fernet.Fernet`
//! (AES-128-CBC + HMAC); this rework uses AES-256-GCM via the `aes-gcm`
//! crate, the idiomatic Rust AEAD choice (see DESIGN.md).

use crate::error::SecretsError;
use crate::store::SecretsStore;
use crate::value::SecretValue;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use async_trait::async_trait;
use rand::RngCore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Default vault location: `~/.config/strata/vault.enc`, next to
/// `key.bin` — domain-neutral, unlike the source's persona-named directory.
pub fn default_vault_dir() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".config").join("strata")
}

/// An on-disk, AES-256-GCM encrypted [`SecretsStore`].
///
/// Writers serialize on a single internal lock while re-encrypting and
/// saving the vault (spec's shared-resource policy); readers hit the
/// in-memory cache under a `RwLock` after the first decrypt.
pub struct VaultSecretsStore {
    vault_path: PathBuf,
    key_path: PathBuf,
    cache: RwLock<HashMap<String, Vec<u8>>>,
    write_lock: Mutex<()>,
}

impl VaultSecretsStore {
    /// Uses [`default_vault_dir`] for both the key and vault files.
    pub fn new() -> Self {
        Self::with_vault_path(default_vault_dir().join("vault.enc"))
    }

    pub fn with_vault_path(vault_path: impl Into<PathBuf>) -> Self {
        let vault_path = vault_path.into();
        let key_path = vault_path
            .parent()
            .map(|p| p.join("key.bin"))
            .unwrap_or_else(|| PathBuf::from("key.bin"));
        Self {
            vault_path,
            key_path,
            cache: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    async fn ensure_directories(&self) -> Result<(), SecretsError> {
        if let Some(parent) = self.vault_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SecretsError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            set_owner_only_dir(parent).await?;
        }
        Ok(())
    }

    async fn get_or_create_key(&self) -> Result<[u8; KEY_LEN], SecretsError> {
        if let Ok(bytes) = tokio::fs::read(&self.key_path).await {
            if bytes.len() == KEY_LEN {
                let mut key = [0u8; KEY_LEN];
                key.copy_from_slice(&bytes);
                return Ok(key);
            }
        }
        self.ensure_directories().await?;
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        tokio::fs::write(&self.key_path, key)
            .await
            .map_err(|source| SecretsError::Io {
                path: self.key_path.clone(),
                source,
            })?;
        set_owner_only_file(&self.key_path).await?;
        Ok(key)
    }

    async fn cipher(&self) -> Result<Aes256Gcm, SecretsError> {
        let key_bytes = self.get_or_create_key().await?;
        Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes)))
    }

    /// Loads and decrypts the vault. On any failure, treats the vault as
    /// empty and logs once, matching the source's failure semantics.
    async fn load_vault(&self) -> HashMap<String, String> {
        match self.try_load_vault().await {
            Ok(map) => map,
            Err(err) => {
                tracing::error!(error = %err, "failed to load vault");
                HashMap::new()
            }
        }
    }

    async fn try_load_vault(&self) -> Result<HashMap<String, String>, SecretsError> {
        let blob = match tokio::fs::read(&self.vault_path).await {
            Ok(b) => b,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => {
                return Err(SecretsError::Io {
                    path: self.vault_path.clone(),
                    source,
                });
            }
        };
        if blob.is_empty() {
            return Ok(HashMap::new());
        }
        if blob.len() < NONCE_LEN {
            return Err(SecretsError::DecryptionFailed);
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let cipher = self.cipher().await?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| SecretsError::DecryptionFailed)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| SecretsError::MalformedVault(e.to_string()))
    }

    async fn save_vault(&self, vault: &HashMap<String, String>) -> Result<(), SecretsError> {
        self.ensure_directories().await?;
        let plaintext =
            serde_json::to_vec(vault).map_err(|e| SecretsError::MalformedVault(e.to_string()))?;
        let cipher = self.cipher().await?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_ref())
            .map_err(|_| SecretsError::EncryptionFailed)?;
        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        tokio::fs::write(&self.vault_path, blob)
            .await
            .map_err(|source| SecretsError::Io {
                path: self.vault_path.clone(),
                source,
            })?;
        set_owner_only_file(&self.vault_path).await?;
        Ok(())
    }
}

impl Default for VaultSecretsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretsStore for VaultSecretsStore {
    async fn get(&self, name: &str, default: Option<&str>) -> Option<SecretValue> {
        if let Ok(env_value) = std::env::var(name) {
            if !env_value.is_empty() {
                return Some(SecretValue::from_string(env_value));
            }
        }

        if let Some(cached) = self.cache.read().await.get(name) {
            return Some(SecretValue::new(cached.clone()));
        }

        let vault = self.load_vault().await;
        if let Some(value) = vault.get(name) {
            self.cache
                .write()
                .await
                .insert(name.to_string(), value.clone().into_bytes());
            return Some(SecretValue::from_string(value.clone()));
        }

        default.map(SecretValue::from_string)
    }

    async fn set(&self, name: &str, value: SecretValue) -> Result<(), SecretsError> {
        let _guard = self.write_lock.lock().await;
        let mut vault = self.load_vault().await;
        let as_string = value
            .to_string_lossy()
            .ok_or_else(|| SecretsError::MalformedVault("secret value is not UTF-8".into()))?;
        vault.insert(name.to_string(), as_string.clone());
        self.save_vault(&vault).await?;
        self.cache
            .write()
            .await
            .insert(name.to_string(), as_string.into_bytes());
        tracing::info!(secret = name, "secret stored securely");
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool, SecretsError> {
        let _guard = self.write_lock.lock().await;
        let mut vault = self.load_vault().await;
        let removed = vault.remove(name).is_some();
        if removed {
            self.save_vault(&vault).await?;
            self.cache.write().await.remove(name);
            tracing::info!(secret = name, "secret removed");
        }
        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<String>, SecretsError> {
        Ok(self.load_vault().await.into_keys().collect())
    }

    async fn rotate(&self, name: &str, new_value: SecretValue) -> Result<(), SecretsError> {
        let existed = self.get(name, None).await.is_some();
        self.set(name, new_value).await?;
        let action = if existed { "rotated" } else { "created" };
        let user = std::env::var("USER").unwrap_or_else(|_| "unknown".into());
        let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".into());
        tracing::info!(secret = name, action, actor = %format!("{user}@{host}"), "secret rotated");
        Ok(())
    }
}

#[cfg(unix)]
async fn set_owner_only_dir(path: &Path) -> Result<(), SecretsError> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o700);
    tokio::fs::set_permissions(path, perms)
        .await
        .map_err(|source| SecretsError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(not(unix))]
async fn set_owner_only_dir(_path: &Path) -> Result<(), SecretsError> {
    Ok(())
}

#[cfg(unix)]
async fn set_owner_only_file(path: &Path) -> Result<(), SecretsError> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o600);
    tokio::fs::set_permissions(path, perms)
        .await
        .map_err(|source| SecretsError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(not(unix))]
async fn set_owner_only_file(_path: &Path) -> Result<(), SecretsError> {
    Ok(())
}
