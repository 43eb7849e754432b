//! Salted one-way password hashing (Argon2id, PHC string format).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;

/// Verified against when the username is unknown, so that a miss costs the
/// same as a wrong password.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("nutrition-dummy-password").ok());

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Constant-time check of `password` against a stored PHC hash.
///
/// A malformed stored hash never matches.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Burn one verification against the dummy hash. Always false.
pub(crate) fn verify_against_dummy(password: &str) -> bool {
    if let Some(dummy) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, dummy);
    }
    false
}
