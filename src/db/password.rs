//! Argon2 password hashing.
//!
//! Hashing is deliberately slow, so both operations run on the blocking pool.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    Hash(String),
    #[error("Hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Hash compared against when the account does not exist, so unknown emails
/// cost as much as wrong passwords.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_blocking("internhub-dummy-password").ok());

fn hash_blocking(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

fn verify_blocking(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hash a password into a PHC string with a fresh random salt.
pub async fn hash_password(password: &str) -> Result<String, PasswordError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&password)).await?
}

/// Verify a password against a stored hash.
///
/// With `None` the password is checked against a dummy hash and the result is
/// always `false`.
pub async fn verify_password(password: &str, hash: Option<String>) -> Result<bool, PasswordError> {
    let password = password.to_owned();
    let matched = tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_blocking(&password, &hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_blocking(&password, dummy);
            }
            false
        }
    })
    .await?;
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("secret123").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret123", Some(hash.clone())).await.unwrap());
        assert!(!verify_password("wrong", Some(hash)).await.unwrap());
    }

    #[tokio::test]
    async fn test_salt_differs_per_hash() {
        let first = hash_password("secret123").await.unwrap();
        let second = hash_password("secret123").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_missing_hash_never_matches() {
        assert!(!verify_password("internhub-dummy-password", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_garbage_hash_never_matches() {
        assert!(
            !verify_password("secret123", Some("not-a-phc-string".into()))
                .await
                .unwrap()
        );
    }
}
