//! # strata-core — shared vocabulary for the strata workspace
//!
//! Every `strata-*` crate depends on this one for the handful of types that
//! need to mean exactly the same thing everywhere: the memory isolation
//! [`Domain`], the storage [`Tier`], typed ids, a wire-stable [`DurationMs`],
//! and content-hashing via [`sha256_hex`].
//!
//! Nothing here talks to a network, a filesystem, or a clock beyond
//! `chrono::Utc::now`. Components that need those live in their own crate.

pub mod domain;
pub mod duration;
pub mod error;
pub mod hash;
pub mod id;

pub use domain::{Domain, Tier};
pub use duration::DurationMs;
pub use error::CoreError;
pub use hash::{canonical_json, sha256_hex};
pub use id::{ConnectorId, SecretName, TaskId};
