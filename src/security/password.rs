use anyhow::{Context, anyhow};
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use tracing::warn;

/// Hashes a password with argon2id and a fresh random salt, producing a PHC string
/// suitable for storage.
pub fn hash_password(password: &str) -> Result<String, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("password hash failure: {err}"))
        .context("hashing a new password")?;

    Ok(hash.to_string())
}

/// Checks a login attempt against a stored PHC hash string. An unparseable stored hash
/// counts as a failed verification rather than an error so login can't be used to probe
/// for corrupt records.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(hash) => hash,
        Err(err) => {
            warn!("Stored password hash could not be parsed: {err}");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
