//! Legacy password hashing using Argon2id
//!
//! Stored as `salt_hex$hash_hex`. Plaintext passwords never reach the store.

use anyhow::{anyhow, Result};
use argon2::Argon2;
use rand::RngCore;

fn derive(password: &str, salt: &[u8]) -> Result<[u8; 32]> {
    let mut out = [0u8; 32];
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut out)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(out)
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);

    let hash = derive(password, &salt)?;
    Ok(format!("{}${}", hex::encode(salt), hex::encode(hash)))
}

/// Check a password against a stored hash
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, hash_hex)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(hash_hex)) else {
        return false;
    };
    match derive(password, &salt) {
        Ok(actual) => actual.as_slice() == expected.as_slice(),
        Err(_) => false,
    }
}
