//! Core traits for Kuppi abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CREDENTIAL STORE
// =============================================================================

/// Persisted user records keyed by email.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by email.
    async fn get(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Whether a user is registered under this email.
    async fn exists(&self, email: &str) -> Result<bool> {
        Ok(self.get(email).await?.is_some())
    }

    /// Replace the stored password hash. Returns false if no such user.
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool>;
}

/// Notes owned by a user. Every operation fails with `UserNotFound`
/// when the owner does not exist.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Append a note to the owner's sequence, stamped with `created_at`.
    async fn insert(
        &self,
        owner: &str,
        req: CreateNoteRequest,
        created_at: DateTime<Utc>,
    ) -> Result<Note>;

    /// List the owner's notes in creation order.
    async fn list(&self, owner: &str) -> Result<Vec<NoteSummary>>;

    /// Fetch one note. Fails with `NoteNotFound` for an unknown id.
    async fn fetch(&self, owner: &str, id: Uuid) -> Result<Note>;

    /// Delete one note. Fails with `NoteNotFound` for an unknown id.
    async fn delete(&self, owner: &str, id: Uuid) -> Result<()>;

    /// Delete every note of the owner, returning how many were removed.
    async fn delete_all(&self, owner: &str) -> Result<u64>;
}

// =============================================================================
// PENDING REGISTRATIONS
// =============================================================================

/// Staging area for unconfirmed signups.
#[async_trait]
pub trait PendingRegistrationRepository: Send + Sync {
    /// Insert or replace the pending signup for `pending.email`.
    async fn upsert(&self, pending: PendingRegistration) -> Result<()>;

    async fn get(&self, email: &str) -> Result<Option<PendingRegistration>>;

    /// Remove the pending signup. Returns false if none existed.
    async fn delete(&self, email: &str) -> Result<bool>;

    /// Atomically move the pending signup into the credential store.
    ///
    /// The new account is stamped with `created_at`. Fails with `NotFound`
    /// if nothing is pending, and with `Conflict` (after discarding the
    /// pending entry) if the user already exists.
    async fn promote(&self, email: &str, created_at: DateTime<Utc>) -> Result<UserRecord>;
}

// =============================================================================
// OTP LEDGER
// =============================================================================

/// Keyed store of live OTP entries, partitioned by purpose.
///
/// Each `(purpose, email)` pair holds at most one entry.
#[async_trait]
pub trait OtpLedger: Send + Sync {
    async fn get(&self, purpose: OtpPurpose, email: &str) -> Result<Option<OtpEntry>>;

    /// Store `entry`, replacing the live entry for its key only when that
    /// one was issued at or before `cooldown_start`, or after
    /// `entry.issued_at`.
    ///
    /// Check and write are one atomic step. Returns false, leaving the
    /// ledger untouched, when the live entry is still cooling down.
    async fn insert_if_cooled(
        &self,
        entry: OtpEntry,
        cooldown_start: DateTime<Utc>,
    ) -> Result<bool>;

    /// Atomically spend one attempt on the live entry.
    ///
    /// Returns the entry with its incremented counter, or `None` when no
    /// entry exists or it already holds `max_attempts` attempts.
    async fn claim_attempt(
        &self,
        purpose: OtpPurpose,
        email: &str,
        max_attempts: u32,
    ) -> Result<Option<OtpEntry>>;

    /// Remove the entry. Returns false if none existed.
    async fn remove(&self, purpose: OtpPurpose, email: &str) -> Result<bool>;
}

/// Single-use permissions to change a password, created by a successful
/// reset-OTP verification.
#[async_trait]
pub trait ResetGrantRepository: Send + Sync {
    /// Record (or refresh) a grant for the email.
    async fn grant(&self, email: &str, granted_at: DateTime<Utc>) -> Result<()>;

    /// Atomically take the grant, returning when it was issued.
    async fn consume(&self, email: &str) -> Result<Option<DateTime<Utc>>>;
}

// =============================================================================
// EXTERNAL COLLABORATORS
// =============================================================================

/// Delivers a message to an email address.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<()>;
}

/// Text generation backend.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Extracts text from an image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// `language` is an engine-specific hint (for Tesseract, e.g. `sin`, `eng`).
    async fn extract(&self, image: &[u8], language: &str) -> Result<String>;
}

/// Source of wall-clock time for expiry and cooldown decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
