//! HMAC-SHA256 webhook signature verification.
//!
//! `base_connector.py`'s `_verify_webhook_signature` is a placeholder that
//! always returns `true`. Webhook verification isn't a named non-goal, so
//! this crate carries a real default instead of copying the stub.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes the lowercase hex HMAC-SHA256 of `payload` under `secret` and
/// compares it to `signature_hex` in constant time (via `Mac::verify_slice`).
pub fn verify_signature(secret: &[u8], payload: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex_decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

fn hex_decode(s: &str) -> Result<Vec<u8>, ()> {
    if s.len() % 2 != 0 {
        return Err(());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| ()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &[u8], payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(payload);
        mac.finalize()
            .into_bytes()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    #[test]
    fn accepts_a_correctly_signed_payload() {
        let secret = b"top-secret";
        let payload = b"{\"event\":\"updated\"}";
        let sig = sign(secret, payload);
        assert!(verify_signature(secret, payload, &sig));
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let secret = b"top-secret";
        let sig = sign(secret, b"{\"event\":\"updated\"}");
        assert!(!verify_signature(secret, b"{\"event\":\"deleted\"}", &sig));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(!verify_signature(b"secret", b"payload", "not-hex"));
    }
}
