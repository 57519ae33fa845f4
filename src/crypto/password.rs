use crate::error::app_error::AppError;
use argon2::Argon2;
use base64::{Engine as _, engine::general_purpose};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

/// How the admin password is stored.
///
/// `Argon2` writes salted PHC strings. `LegacySha256` writes the unsalted
/// SHA-256 digest older deployments used; it exists only so those databases
/// keep working and should not be picked for new installs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PasswordScheme {
    #[default]
    Argon2,
    LegacySha256,
}

/// A real Argon2 hash generated once, used as a timing decoy so that login
/// requests for unknown logins take as long as requests for the admin.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"dummy-never-matches", &salt)
        .map(|hash| hash.to_string())
        .unwrap_or_default()
});

/// Unsalted SHA-256 digest of `password`, URL-safe base64 with padding.
pub fn legacy_hash(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    general_purpose::URL_SAFE.encode(digest)
}

pub fn hash_password(password: &str, scheme: PasswordScheme) -> Result<String, AppError> {
    match scheme {
        PasswordScheme::Argon2 => {
            let salt = SaltString::generate(&mut OsRng);
            let hash = Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| AppError::password_hash("Failed to hash password", e))?;
            Ok(hash.to_string())
        }
        PasswordScheme::LegacySha256 => Ok(legacy_hash(password)),
    }
}

/// Checks `password` against a stored hash of either scheme.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if stored.starts_with('$') {
        return match PasswordHash::new(stored) {
            Ok(hash) => Argon2::default().verify_password(password.as_bytes(), &hash).is_ok(),
            Err(_) => false,
        };
    }

    constant_time_eq(legacy_hash(password).as_bytes(), stored.as_bytes())
}

/// Throwaway Argon2 verification to equalize response timing for unknown logins.
pub fn dummy_verify(password: &str) {
    if let Ok(hash) = PasswordHash::new(&DUMMY_HASH) {
        let _ = Argon2::default().verify_password(password.as_bytes(), &hash);
    }
}

pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
