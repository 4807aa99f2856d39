use argon2::Argon2;
use rand::Rng;

use crate::error::AppError;

/// Hash a password with Argon2id under a freshly generated salt.
/// Returns (hash, salt), both stored alongside the user record.
pub fn hash_new_password(password: &str) -> Result<(Vec<u8>, Vec<u8>), AppError> {
    let salt: [u8; 32] = rand::thread_rng().gen();
    let hash = derive(password, &salt)?;
    Ok((hash.to_vec(), salt.to_vec()))
}

/// Verify a password against the stored hash and salt by recomputing.
pub fn verify_password(password: &str, stored_hash: &[u8], salt: &[u8]) -> Result<bool, AppError> {
    let computed = derive(password, salt)?;
    Ok(computed.as_slice() == stored_hash)
}

fn derive(password: &str, salt: &[u8]) -> Result<[u8; 32], AppError> {
    let argon2 = Argon2::default();
    let mut hash = [0u8; 32];

    argon2
        .hash_password_into(password.as_bytes(), salt, &mut hash)
        .map_err(|e| AppError::Crypto(format!("Password hashing failed: {}", e)))?;

    Ok(hash)
}
