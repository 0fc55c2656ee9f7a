//! Error types for the Kuppi backend.

use thiserror::Error;

/// Result type alias using Kuppi's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Kuppi operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// No account is registered under this email
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Resource already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (authenticated but not allowed)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// An OTP was requested again inside the cooldown window
    #[error("Please wait {retry_after_secs}s before requesting another OTP")]
    RateLimited { retry_after_secs: u64 },

    /// No live OTP entry exists for the email
    #[error("No OTP found for this email")]
    OtpNotFound,

    /// The OTP entry outlived its expiry window
    #[error("OTP has expired. Please request a new one")]
    OtpExpired,

    /// The OTP entry exhausted its attempt budget
    #[error("Too many incorrect attempts. Request a new OTP")]
    TooManyAttempts,

    /// Supplied code did not match
    #[error("Invalid OTP. Please try again")]
    InvalidCode,

    /// The notifier could not deliver a message
    #[error("Notification failed: {0}")]
    NotificationFailed(String),

    /// Generative text call failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Text extraction from an image failed
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the verification failures produced by the OTP engine.
    pub fn is_otp_rejection(&self) -> bool {
        matches!(
            self,
            Error::OtpNotFound | Error::OtpExpired | Error::TooManyAttempts | Error::InvalidCode
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
