//! Domain models for accounts, notes, and the OTP credential lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ACCOUNTS
// =============================================================================

/// A confirmed account in the credential store.
///
/// Created when a signup OTP is confirmed. Never destroyed implicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    pub name: String,
    /// PHC-formatted Argon2id hash. Never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Public view of the account safe to return over HTTP.
    pub fn profile(&self) -> PublicProfile {
        PublicProfile {
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// Public profile returned alongside bearer tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PublicProfile {
    pub email: String,
    pub name: String,
}

/// Signup data waiting for OTP confirmation.
///
/// At most one exists per email; a new signup replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRegistration {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// NOTES
// =============================================================================

/// A note owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Listing view of a note (id and title only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NoteSummary {
    pub id: Uuid,
    pub title: String,
}

impl From<&Note> for NoteSummary {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
        }
    }
}

/// Request for creating a new note.
#[derive(Debug, Clone)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
}

// =============================================================================
// OTP LEDGER
// =============================================================================

/// Which ledger an OTP entry belongs to.
///
/// Ledgers are independent: a signup code never satisfies a reset
/// verification for the same email and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Signup,
    PasswordReset,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Signup => "signup",
            OtpPurpose::PasswordReset => "password_reset",
        }
    }
}

impl std::fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OtpPurpose {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup" => Ok(OtpPurpose::Signup),
            "password_reset" => Ok(OtpPurpose::PasswordReset),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown OTP purpose: {}",
                other
            ))),
        }
    }
}

/// A live one-time code for one email in one ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEntry {
    pub email: String,
    pub purpose: OtpPurpose,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub attempts: u32,
}

impl OtpEntry {
    /// A freshly issued entry with a zeroed attempt counter.
    pub fn issue(email: &str, purpose: OtpPurpose, code: String, now: DateTime<Utc>) -> Self {
        Self {
            email: email.to_string(),
            purpose,
            code,
            issued_at: now,
            attempts: 0,
        }
    }
}
