//! Per-user note storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use kuppi_core::{CreateNoteRequest, Error, Note, NoteRepository, NoteSummary, Result};

/// PostgreSQL note repository.
///
/// Notes keep their insertion order through the `seq` column.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn require_owner(&self, owner: &str) -> Result<()> {
        let found: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM user_account WHERE email = $1)")
                .bind(owner)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        if found {
            Ok(())
        } else {
            Err(Error::UserNotFound(owner.to_string()))
        }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(
        &self,
        owner: &str,
        req: CreateNoteRequest,
        created_at: DateTime<Utc>,
    ) -> Result<Note> {
        let id = kuppi_core::new_v7();

        // Inserting through a SELECT on the owner makes a missing user a
        // zero-row insert instead of a foreign key violation.
        let result = sqlx::query(
            "INSERT INTO note (id, owner_email, title, content, created_at)
             SELECT $1, email, $3, $4, $5 FROM user_account WHERE email = $2",
        )
        .bind(id)
        .bind(owner)
        .bind(&req.title)
        .bind(&req.content)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::UserNotFound(owner.to_string()));
        }

        Ok(Note {
            id,
            title: req.title,
            content: req.content,
            created_at,
        })
    }

    async fn list(&self, owner: &str) -> Result<Vec<NoteSummary>> {
        self.require_owner(owner).await?;

        let rows = sqlx::query("SELECT id, title FROM note WHERE owner_email = $1 ORDER BY seq")
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|r| NoteSummary {
                id: r.get("id"),
                title: r.get("title"),
            })
            .collect())
    }

    async fn fetch(&self, owner: &str, id: Uuid) -> Result<Note> {
        let row = sqlx::query(
            "SELECT id, title, content, created_at FROM note WHERE owner_email = $1 AND id = $2",
        )
        .bind(owner)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(r) => Ok(Note {
                id: r.get("id"),
                title: r.get("title"),
                content: r.get("content"),
                created_at: r.get("created_at"),
            }),
            None => {
                self.require_owner(owner).await?;
                Err(Error::NoteNotFound(id))
            }
        }
    }

    async fn delete(&self, owner: &str, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE owner_email = $1 AND id = $2")
            .bind(owner)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            self.require_owner(owner).await?;
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }

    async fn delete_all(&self, owner: &str) -> Result<u64> {
        self.require_owner(owner).await?;

        let result = sqlx::query("DELETE FROM note WHERE owner_email = $1")
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}
