//! Password hashing
//!
//! bcrypt is CPU-bound, so hashing and verification run on the blocking
//! thread pool.

use crate::error::{GatherError, Result};

/// bcrypt work factor for new hashes
pub const BCRYPT_COST: u32 = 12;

/// Hash a password
pub async fn hash_password(password: String) -> Result<String> {
    hash_password_with_cost(password, BCRYPT_COST).await
}

async fn hash_password_with_cost(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| GatherError::Internal(format!("password hashing task failed: {}", e)))?
        .map_err(GatherError::from)
}

/// Check a password against a stored hash. A malformed hash never matches.
pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| GatherError::Internal(format!("password verification task failed: {}", e)))?;

    Ok(verified.unwrap_or(false))
}
