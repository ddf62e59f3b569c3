//! Deterministic identities for simulated peers

use sha2::{Digest, Sha256};
use toxbridge_core::PublicKey;

/// Public key derived from a peer name
///
/// The same name always yields the same key, so scripted scenarios and
/// persisted test state stay reproducible across runs.
pub fn key_from_name(name: &str) -> PublicKey {
    let digest = Sha256::digest(name.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    PublicKey::new(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_name_is_stable() {
        assert_eq!(key_from_name("alice"), key_from_name("alice"));
        assert_ne!(key_from_name("alice"), key_from_name("bob"));
        // sha256("") is well known
        assert!(key_from_name("").to_hex().starts_with("e3b0c442"));
    }
}
