//! Password key derivation

use crate::{Error, Result};
use aes_gcm::aead::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Derived key length (bytes)
pub const KEY_LEN: usize = 32;

/// Derive a 256-bit key with PBKDF2-HMAC-SHA256
pub fn derive_key(password: &str, salt: &[u8], iterations: u32) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if iterations == 0 {
        return Err(Error::Encryption("KDF iterations must be positive".to_string()));
    }
    if salt.is_empty() {
        return Err(Error::Encryption("KDF salt is empty".to_string()));
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut *key);
    Ok(key)
}

/// Fresh random salt
pub fn generate_salt(size: usize) -> Vec<u8> {
    let mut salt = vec![0u8; size];
    OsRng.fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc7914_vector() {
        // PBKDF2-HMAC-SHA256 test vector (RFC 7914 section 11)
        let key = derive_key("passwd", b"salt", 1).unwrap();
        assert_eq!(
            hex::encode(&key[..]),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
        );
    }

    #[test]
    fn test_deterministic_and_salt_sensitive() {
        let salt = generate_salt(16);
        let a = derive_key("hunter2", &salt, 1000).unwrap();
        let b = derive_key("hunter2", &salt, 1000).unwrap();
        assert_eq!(*a, *b);

        let other = generate_salt(16);
        assert_ne!(salt, other);
        let c = derive_key("hunter2", &other, 1000).unwrap();
        assert_ne!(*a, *c);
    }

    #[test]
    fn test_rejects_degenerate_parameters() {
        assert!(derive_key("pw", b"salt", 0).is_err());
        assert!(derive_key("pw", b"", 10).is_err());
    }
}
