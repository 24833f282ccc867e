//! # strata-secrets — encrypted credential supply
//!
//! Supplies credentials to every other `strata-*` component by logical
//! name, without leaking raw values to logs or stack traces.
//!
//! [`VaultSecretsStore`] is the production implementation: an AES-256-GCM
//! encrypted on-disk vault with owner-only file permissions, an in-memory
//! cache, and environment-variable override. [`EnvOnlySecretsStore`] is a
//! lighter-weight double for tests and embedders that don't need
//! persistence. Both implement [`SecretsStore`], so callers depend on the
//! trait, never the concrete type — there is no process-wide singleton;
//! construct one store at your composition root and share it by `Arc`.

mod env;
mod error;
mod store;
mod value;
mod vault;

pub use env::EnvOnlySecretsStore;
pub use error::SecretsError;
pub use store::{IntegrationCredentials, SecretsStore, INTEGRATION_SUFFIXES};
pub use value::SecretValue;
pub use vault::{default_vault_dir, VaultSecretsStore};
