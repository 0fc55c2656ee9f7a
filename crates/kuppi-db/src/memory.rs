//! In-process store implementing every repository trait.
//!
//! Used for local development (`STORE_BACKEND=memory`) and tests. All
//! state sits behind one async mutex, so each trait method is atomic with
//! respect to the others, promotion included.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use kuppi_core::{
    CreateNoteRequest, Error, Note, NoteRepository, NoteSummary, OtpEntry, OtpLedger, OtpPurpose,
    PendingRegistration, PendingRegistrationRepository, ResetGrantRepository, Result, UserRecord,
    UserRepository,
};

#[derive(Default)]
struct Inner {
    users: HashMap<String, UserRecord>,
    /// Notes per owner, in insertion order.
    notes: HashMap<String, Vec<Note>>,
    pending: HashMap<String, PendingRegistration>,
    otp: HashMap<(OtpPurpose, String), OtpEntry>,
    reset_grants: HashMap<String, DateTime<Utc>>,
}

impl Inner {
    fn require_user(&self, email: &str) -> Result<()> {
        if self.users.contains_key(email) {
            Ok(())
        } else {
            Err(Error::UserNotFound(email.to_string()))
        }
    }
}

/// Mutex-guarded in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an account directly, bypassing signup.
    pub async fn seed_user(&self, user: UserRecord) {
        self.inner
            .lock()
            .await
            .users
            .insert(user.email.clone(), user);
    }

    /// Number of live OTP entries across both ledgers.
    pub async fn otp_count(&self) -> usize {
        self.inner.lock().await.otp.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.inner.lock().await.users.get(email).cloned())
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        match inner.users.get_mut(email) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl NoteRepository for MemoryStore {
    async fn insert(
        &self,
        owner: &str,
        req: CreateNoteRequest,
        created_at: DateTime<Utc>,
    ) -> Result<Note> {
        let mut inner = self.inner.lock().await;
        inner.require_user(owner)?;

        let note = Note {
            id: kuppi_core::new_v7(),
            title: req.title,
            content: req.content,
            created_at,
        };
        inner
            .notes
            .entry(owner.to_string())
            .or_default()
            .push(note.clone());
        Ok(note)
    }

    async fn list(&self, owner: &str) -> Result<Vec<NoteSummary>> {
        let inner = self.inner.lock().await;
        inner.require_user(owner)?;
        Ok(inner
            .notes
            .get(owner)
            .map(|notes| notes.iter().map(NoteSummary::from).collect())
            .unwrap_or_default())
    }

    async fn fetch(&self, owner: &str, id: Uuid) -> Result<Note> {
        let inner = self.inner.lock().await;
        inner.require_user(owner)?;
        inner
            .notes
            .get(owner)
            .and_then(|notes| notes.iter().find(|n| n.id == id))
            .cloned()
            .ok_or(Error::NoteNotFound(id))
    }

    async fn delete(&self, owner: &str, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.require_user(owner)?;
        let notes = inner.notes.entry(owner.to_string()).or_default();
        match notes.iter().position(|n| n.id == id) {
            Some(idx) => {
                notes.remove(idx);
                Ok(())
            }
            None => Err(Error::NoteNotFound(id)),
        }
    }

    async fn delete_all(&self, owner: &str) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        inner.require_user(owner)?;
        Ok(inner
            .notes
            .remove(owner)
            .map(|notes| notes.len() as u64)
            .unwrap_or(0))
    }
}

#[async_trait]
impl PendingRegistrationRepository for MemoryStore {
    async fn upsert(&self, pending: PendingRegistration) -> Result<()> {
        self.inner
            .lock()
            .await
            .pending
            .insert(pending.email.clone(), pending);
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<PendingRegistration>> {
        Ok(self.inner.lock().await.pending.get(email).cloned())
    }

    async fn delete(&self, email: &str) -> Result<bool> {
        Ok(self.inner.lock().await.pending.remove(email).is_some())
    }

    async fn promote(&self, email: &str, created_at: DateTime<Utc>) -> Result<UserRecord> {
        let mut inner = self.inner.lock().await;
        let pending = inner
            .pending
            .remove(email)
            .ok_or_else(|| Error::NotFound(format!("No pending registration for {}", email)))?;

        if inner.users.contains_key(email) {
            return Err(Error::Conflict("User already exists".to_string()));
        }

        let user = UserRecord {
            email: pending.email,
            name: pending.name,
            password_hash: pending.password_hash,
            created_at,
        };
        inner.users.insert(user.email.clone(), user.clone());
        Ok(user)
    }
}

#[async_trait]
impl OtpLedger for MemoryStore {
    async fn get(&self, purpose: OtpPurpose, email: &str) -> Result<Option<OtpEntry>> {
        Ok(self
            .inner
            .lock()
            .await
            .otp
            .get(&(purpose, email.to_string()))
            .cloned())
    }

    async fn insert_if_cooled(
        &self,
        entry: OtpEntry,
        cooldown_start: DateTime<Utc>,
    ) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let key = (entry.purpose, entry.email.clone());
        if let Some(live) = inner.otp.get(&key) {
            if live.issued_at > cooldown_start && live.issued_at <= entry.issued_at {
                return Ok(false);
            }
        }
        inner.otp.insert(key, entry);
        Ok(true)
    }

    async fn claim_attempt(
        &self,
        purpose: OtpPurpose,
        email: &str,
        max_attempts: u32,
    ) -> Result<Option<OtpEntry>> {
        let mut inner = self.inner.lock().await;
        match inner.otp.get_mut(&(purpose, email.to_string())) {
            Some(entry) if entry.attempts < max_attempts => {
                entry.attempts += 1;
                Ok(Some(entry.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn remove(&self, purpose: OtpPurpose, email: &str) -> Result<bool> {
        Ok(self
            .inner
            .lock()
            .await
            .otp
            .remove(&(purpose, email.to_string()))
            .is_some())
    }
}

#[async_trait]
impl ResetGrantRepository for MemoryStore {
    async fn grant(&self, email: &str, granted_at: DateTime<Utc>) -> Result<()> {
        self.inner
            .lock()
            .await
            .reset_grants
            .insert(email.to_string(), granted_at);
        Ok(())
    }

    async fn consume(&self, email: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.inner.lock().await.reset_grants.remove(email))
    }
}
