//! Application services: the flows behind the HTTP handlers.

pub mod notes;
pub mod notifier;
pub mod otp;
pub mod password_reset;
pub mod registration;
pub mod session;
pub mod templates;

use chrono::{DateTime, Utc};
use serde::Serialize;

use kuppi_core::{Error, PublicProfile, Result};
use kuppi_crypto::{CryptoError, PasswordHashing};

pub use notes::NotesService;
pub use notifier::{notifier_from_config, DisabledNotifier, HttpMailer, RecordingNotifier};
pub use otp::{OtpEngine, OtpPolicy};
pub use password_reset::PasswordResetService;
pub use registration::RegistrationService;
pub use session::SessionService;

/// A bearer token together with the account it was minted for.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AuthSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: PublicProfile,
}

pub(crate) fn crypto_error(e: CryptoError) -> Error {
    match e {
        CryptoError::InvalidToken(_) | CryptoError::TokenExpired => {
            Error::Unauthorized("Invalid or expired token".to_string())
        }
        other => Error::Internal(other.to_string()),
    }
}

/// Hash off the async executor; Argon2 is deliberately slow.
pub(crate) async fn hash_password(hasher: &PasswordHashing, password: &str) -> Result<String> {
    let hasher = hasher.clone();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(crypto_error)
}

pub(crate) async fn verify_password(
    hasher: &PasswordHashing,
    password: &str,
    stored_hash: &str,
) -> Result<bool> {
    let hasher = hasher.clone();
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
        .await
        .map_err(|e| Error::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(crypto_error)
}
