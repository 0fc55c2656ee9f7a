//! Error types for cryptographic operations.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Stored password hash could not be parsed.
    #[error("Malformed password hash: {0}")]
    MalformedHash(String),

    /// Invalid hashing parameters.
    #[error("Invalid KDF parameters: {0}")]
    InvalidParams(String),

    /// Token signing secret is too short.
    #[error("Token secret too short (minimum {0} bytes required)")]
    WeakSecret(usize),

    /// Token is malformed or its signature does not verify.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token signature is valid but the token has expired.
    #[error("Token has expired")]
    TokenExpired,

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
