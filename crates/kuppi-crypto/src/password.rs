//! Password hashing using Argon2id.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`)
//! so the parameters travel with the hash and older hashes keep verifying
//! after the defaults change.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Argon2id cost parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory in KiB (default: 19456 = 19 MiB).
    pub memory_kib: u32,
    /// Time iterations (default: 2).
    pub iterations: u32,
    /// Parallelism degree (default: 1).
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19456, // 19 MiB
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// High-security parameters for servers with memory to spare.
    pub fn high_security() -> Self {
        Self {
            memory_kib: 65536, // 64 MiB
            iterations: 3,
            parallelism: 4,
        }
    }

    /// Minimal cost for tests. Never use in production.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Hashes and verifies account passwords.
#[derive(Clone)]
pub struct PasswordHashing {
    argon2: Argon2<'static>,
}

impl PasswordHashing {
    pub fn new(params: &KdfParams) -> CryptoResult<Self> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| CryptoError::InvalidParams(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> CryptoResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CryptoError::PasswordHash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check a password against a stored PHC hash.
    ///
    /// The digest comparison inside argon2 is constant-time. A wrong
    /// password yields `Ok(false)`; only an unparseable hash is an error.
    pub fn verify(&self, password: &str, stored_hash: &str) -> CryptoResult<bool> {
        let parsed =
            PasswordHash::new(stored_hash).map_err(|e| CryptoError::MalformedHash(e.to_string()))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CryptoError::PasswordHash(e.to_string())),
        }
    }
}

impl Default for PasswordHashing {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl std::fmt::Debug for PasswordHashing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHashing").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHashing {
        PasswordHashing::new(&KdfParams::insecure_fast()).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let h = hasher();
        let hash = h.hash("secret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(h.verify("secret", &hash).unwrap());
        assert!(!h.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let h = hasher();
        let a = h.hash("secret").unwrap();
        let b = h.hash("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_uses_parameters_from_hash() {
        let fast = hasher();
        let hash = fast.hash("secret").unwrap();
        // A hasher with different defaults still verifies older hashes.
        let other = PasswordHashing::new(&KdfParams {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(other.verify("secret", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        let h = hasher();
        assert!(matches!(
            h.verify("secret", "not-a-phc-string"),
            Err(CryptoError::MalformedHash(_))
        ));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = PasswordHashing::new(&KdfParams {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(CryptoError::InvalidParams(_))));
    }
}
