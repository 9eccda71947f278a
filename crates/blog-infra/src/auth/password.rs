//! Password hashes for blog accounts.
//!
//! Stored hashes are PHC strings (`$argon2id$v=19$...`), so the parameters travel with
//! each hash and older accounts keep verifying if the defaults change.

use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use blog_core::ports::{AuthError, PasswordService};

/// Hashes registration passwords and checks them again at login.
#[derive(Default)]
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingError(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// `Ok(false)` for a wrong password. A stored hash that cannot be read is an
    /// error: the account is broken, not the login attempt.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let stored = PasswordHash::new(hash).map_err(|e| AuthError::HashingError(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::HashingError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verifies_only_the_original_password() {
        let service = Argon2PasswordService::new();

        let hash = service.hash("correct horse").unwrap();

        assert!(service.verify("correct horse", &hash).unwrap());
        assert!(!service.verify("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let service = Argon2PasswordService::new();

        let first = service.hash("same").unwrap();
        let second = service.hash("same").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_hash_is_phc_argon2id() {
        let hash = Argon2PasswordService::new().hash("pw").unwrap();

        assert!(hash.starts_with("$argon2id$"), "{hash}");
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let service = Argon2PasswordService::new();

        let result = service.verify("anything", "not-a-phc-string");

        assert!(matches!(result, Err(AuthError::HashingError(_))));
    }
}
