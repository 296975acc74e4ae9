use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use serde::Serialize;

use crate::config::PasswordHashConfig;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashFormat {
    Argon2,
    Bcrypt,
    Unknown,
}

/// Password hashing primitive consumed by the bootstrapper, the login route
/// and the credential diagnostics.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;

    /// `Ok(false)` for a well-formed hash that does not match; an error when
    /// the stored hash cannot be interpreted at all.
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;

    fn describe_format(&self, hash: &str) -> HashFormat {
        if hash.starts_with("$argon2") {
            HashFormat::Argon2
        } else if hash.starts_with("$2") {
            HashFormat::Bcrypt
        } else {
            HashFormat::Unknown
        }
    }
}

#[derive(Debug, Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    pub fn new(config: &PasswordHashConfig) -> Result<Self> {
        let params = Params::new(config.memory_kib, config.cost.max(1), 1, None).map_err(|e| {
            AppError::ConfigurationError(format!("Invalid password hashing parameters: {}", e))
        })?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            AppError::CredentialError(format!(
                "stored password hash is not usable ({:?} format): {}",
                self.describe_format(hash),
                e
            ))
        })?;

        // Parameters come from the stored hash, not from this hasher.
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::CredentialError(format!(
                "password verification failed: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::new(&PasswordHashConfig { cost: 1, memory_kib: 1024 }).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("123456").unwrap();
        assert_eq!(hasher.describe_format(&hash), HashFormat::Argon2);
        assert!(hasher.verify("123456", &hash).unwrap());
        assert!(!hasher.verify("654321", &hash).unwrap());
    }

    #[test]
    fn test_legacy_bcrypt_hash_is_a_credential_error() {
        let hasher = hasher();
        let bcrypt = "$2a$08$abcdefghijklmnopqrstuuJ2xH3p1yS6Q8w0kq7j3Z8c1o5hVQ7e";
        assert_eq!(hasher.describe_format(bcrypt), HashFormat::Bcrypt);
        assert!(matches!(
            hasher.verify("123456", bcrypt),
            Err(AppError::CredentialError(_))
        ));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = Argon2PasswordHasher::new(&PasswordHashConfig { cost: 1, memory_kib: 1 });
        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }
}
