//! Note operations scoped to the authenticated user.

use std::sync::Arc;

use tracing::debug;

use kuppi_core::{
    parse_id, require_field, Clock, CreateNoteRequest, Note, NoteRepository, NoteSummary, Result,
};

pub struct NotesService {
    notes: Arc<dyn NoteRepository>,
    clock: Arc<dyn Clock>,
}

impl NotesService {
    pub fn new(notes: Arc<dyn NoteRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { notes, clock }
    }

    pub async fn add(
        &self,
        owner: &str,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Note> {
        let title = require_field(title, "title")?.trim().to_string();
        let content = require_field(content, "content")?.to_string();
        let note = self
            .notes
            .insert(owner, CreateNoteRequest { title, content }, self.clock.now())
            .await?;
        debug!(
            subsystem = "api",
            component = "notes",
            op = "add",
            email = %owner,
            note_id = %note.id,
            "Note added"
        );
        Ok(note)
    }

    pub async fn list(&self, owner: &str) -> Result<Vec<NoteSummary>> {
        self.notes.list(owner).await
    }

    /// `raw_id` must be a UUID; anything else is `InvalidInput`.
    pub async fn get(&self, owner: &str, raw_id: &str) -> Result<Note> {
        let id = parse_id(raw_id)?;
        self.notes.fetch(owner, id).await
    }

    pub async fn delete(&self, owner: &str, raw_id: &str) -> Result<()> {
        let id = parse_id(raw_id)?;
        self.notes.delete(owner, id).await
    }

    pub async fn delete_all(&self, owner: &str) -> Result<u64> {
        let removed = self.notes.delete_all(owner).await?;
        debug!(
            subsystem = "api",
            component = "notes",
            op = "delete_all",
            email = %owner,
            removed,
            "Notes cleared"
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kuppi_core::{Error, ManualClock, UserRecord};
    use kuppi_db::MemoryStore;

    async fn service() -> (NotesService, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        store
            .seed_user(UserRecord {
                email: "a@x.com".into(),
                name: "A".into(),
                password_hash: "$argon2id$hash".into(),
                created_at: clock.now(),
            })
            .await;
        (NotesService::new(store, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_add_stamps_note_with_clock() {
        let (notes, clock) = service().await;
        clock.advance_secs(3600);

        let note = notes
            .add("a@x.com", Some("  Physics "), Some("waves"))
            .await
            .unwrap();
        assert_eq!(note.title, "Physics");
        assert_eq!(note.created_at, clock.now());
        assert_eq!(notes.get("a@x.com", &note.id.to_string()).await.unwrap(), note);
    }

    #[tokio::test]
    async fn test_add_requires_title_and_content() {
        let (notes, _) = service().await;
        assert!(matches!(
            notes.add("a@x.com", None, Some("body")).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            notes.add("a@x.com", Some("t"), Some("")).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_id_is_invalid_input() {
        let (notes, _) = service().await;
        assert!(matches!(
            notes.delete("a@x.com", "not-a-uuid").await,
            Err(Error::InvalidInput(_))
        ));
    }
}
