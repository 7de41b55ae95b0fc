//! Account passwords, stored as argon2id PHC strings.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

/// Shortest password `Register` accepts.
pub const MIN_PASSWORD_LEN: usize = 8;

fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, password_hash::Error> {
    let phc = PasswordHash::new(stored)?;
    match hasher().verify_password(password.as_bytes(), &phc) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}
