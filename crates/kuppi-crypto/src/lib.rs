//! # kuppi-crypto
//!
//! Cryptographic primitives for the Kuppi backend.
//!
//! - **Passwords**: Argon2id, PHC-encoded, salted per hash
//! - **Bearer tokens**: HMAC-SHA256 signed compact tokens (`HS256`)
//! - **OTP codes**: uniformly random decimal codes, constant-time comparison
//!
//! ## Examples
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use kuppi_crypto::{KdfParams, PasswordHashing, TokenSigner};
//!
//! let hasher = PasswordHashing::new(&KdfParams::insecure_fast()).unwrap();
//! let hash = hasher.hash("correct horse").unwrap();
//! assert!(hasher.verify("correct horse", &hash).unwrap());
//!
//! let signer = TokenSigner::new(&[7u8; 32]).unwrap();
//! let issued = signer.issue("a@x.com", Utc::now(), Duration::hours(24)).unwrap();
//! let claims = signer.verify(&issued.token, Utc::now()).unwrap();
//! assert_eq!(claims.sub, "a@x.com");
//! ```

pub mod error;
pub mod otp_code;
pub mod password;
pub mod token;

// Re-export commonly used types
pub use error::{CryptoError, CryptoResult};
pub use otp_code::{codes_match, generate_numeric_code};
pub use password::{KdfParams, PasswordHashing};
pub use token::{IssuedToken, TokenClaims, TokenSigner, MIN_SECRET_BYTES};
