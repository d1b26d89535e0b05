// Password hashing and verification (argon2, off the async runtime)

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;

use super::error::{AuthError, AuthResult};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Hash a password with a fresh salt. Runs on the blocking pool.
pub async fn hash_password(password: &str) -> AuthResult<String> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("Task join error: {}", e)))?
}

/// Verify a password against a stored PHC hash string.
///
/// `Ok(false)` on mismatch. A stored hash that cannot be parsed is an error,
/// not a mismatch, so corrupt records show up in the logs.
pub async fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();

    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("Task join error: {}", e)))?
}

/// Hash of a throwaway password, checked when no account matches so that
/// lookups for unknown emails cost the same argon2 work as real ones
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"no-such-account", &salt)
        .map(|hash| hash.to_string())
        .ok()
});

/// Compute the dummy hash ahead of the first login
pub fn prime_dummy_hash() {
    Lazy::force(&DUMMY_HASH);
}

/// Run a full verification against the dummy hash. Always `Ok(false)`.
pub async fn verify_dummy(password: &str) -> AuthResult<bool> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || {
        if let Some(parsed) = DUMMY_HASH.as_deref().and_then(|hash| PasswordHash::new(hash).ok()) {
            let _ = Argon2::default().verify_password(password.as_bytes(), &parsed);
        }
        false
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("Task join error: {}", e)))
}

pub fn validate_password(password: &str, confirm: &str) -> AuthResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::validation(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    if password != confirm {
        return Err(AuthError::validation("Passwords do not match"));
    }
    Ok(())
}
