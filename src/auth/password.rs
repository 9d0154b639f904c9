//! Password hashing
//!
//! Salted one-way hashes. Raw passwords are never stored or logged;
//! verification recomputes the MAC with the stored salt and compares
//! in constant time via the MAC verifier.
//!
//! Stored format: `base64(salt)$base64(hmac_sha256(salt, password))`

use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const SALT_BYTES: usize = 16;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);

    let mac = compute_mac(&salt, password)?;

    Ok(format!(
        "{}${}",
        general_purpose::URL_SAFE_NO_PAD.encode(salt),
        general_purpose::URL_SAFE_NO_PAD.encode(mac)
    ))
}

/// Verify a password against a stored hash.
///
/// Returns `false` for wrong passwords and for malformed stored hashes.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_b64, mac_b64)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = general_purpose::URL_SAFE_NO_PAD.decode(salt_b64) else {
        return false;
    };
    let Ok(expected_mac) = general_purpose::URL_SAFE_NO_PAD.decode(mac_b64) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(&salt) else {
        return false;
    };
    mac.update(password.as_bytes());
    mac.verify_slice(&expected_mac).is_ok()
}

fn compute_mac(salt: &[u8], password: &str) -> Result<Vec<u8>, AppError> {
    let mut mac =
        HmacSha256::new_from_slice(salt).map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(password.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("hunter22").unwrap();
        let b = hash_password("hunter22").unwrap();
        assert_ne!(a, b, "salts must differ");
    }

    #[test]
    fn malformed_stored_hash_fails_closed() {
        assert!(!verify_password("hunter22", "not-a-valid-hash"));
        assert!(!verify_password("hunter22", "a$b$c"));
        assert!(!verify_password("hunter22", "$"));
    }
}
