use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use once_cell::sync::Lazy;
use password_hash::{PasswordHash, SaltString};

/// Hash verified when the email is unknown, so a miss costs the same as a
/// wrong password.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("tesouraria-dummy-password").ok());

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

/// Argon2 verification; the digest comparison inside is constant-time.
/// An unparsable stored hash never matches.
pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

/// Burn one verification against the dummy hash. Always false.
pub fn verify_dummy(password: &str) -> bool {
    if let Some(h) = DUMMY_HASH.as_deref() {
        let _ = verify_password(h, password);
    }
    false
}
