//! Opaque in-memory secret values.

use zeroize::Zeroizing;

/// An opaque secret value. Cannot be logged, serialized, cloned, or
/// compared. Memory is zeroed on drop.
///
/// The only way to read the bytes is [`SecretValue::with_bytes`], which
/// enforces scoped exposure — the value is only visible inside the closure.
pub struct SecretValue {
    inner: Zeroizing<Vec<u8>>,
}

impl SecretValue {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: Zeroizing::new(bytes),
        }
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self::new(value.into().into_bytes())
    }

    /// Scoped exposure. The only sanctioned way to read the secret.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.inner)
    }

    /// Convenience for values known to be UTF-8 (the common case for API
    /// keys and tokens). Returns `None` on invalid UTF-8 rather than
    /// panicking.
    pub fn to_string_lossy(&self) -> Option<String> {
        self.with_bytes(|b| std::str::from_utf8(b).ok().map(str::to_string))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

// Intentionally: no Display, no Clone, no Serialize, no PartialEq.
