//! Staging table for unconfirmed signups and their promotion into
//! `user_account`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, warn};

use kuppi_core::{Error, PendingRegistration, PendingRegistrationRepository, Result, UserRecord};

/// PostgreSQL pending registration repository.
pub struct PgPendingRegistrationRepository {
    pool: Pool<Postgres>,
}

impl PgPendingRegistrationRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PendingRegistrationRepository for PgPendingRegistrationRepository {
    async fn upsert(&self, pending: PendingRegistration) -> Result<()> {
        sqlx::query(
            "INSERT INTO pending_registration (email, name, password_hash, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO UPDATE
             SET name = EXCLUDED.name,
                 password_hash = EXCLUDED.password_hash,
                 created_at = EXCLUDED.created_at",
        )
        .bind(&pending.email)
        .bind(&pending.name)
        .bind(&pending.password_hash)
        .bind(pending.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<PendingRegistration>> {
        let row = sqlx::query(
            "SELECT email, name, password_hash, created_at
             FROM pending_registration WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| PendingRegistration {
            email: r.get("email"),
            name: r.get("name"),
            password_hash: r.get("password_hash"),
            created_at: r.get("created_at"),
        }))
    }

    async fn delete(&self, email: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pending_registration WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn promote(&self, email: &str, created_at: DateTime<Utc>) -> Result<UserRecord> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // DELETE .. RETURNING claims the pending row; a concurrent promote
        // blocks on the row lock and then sees nothing to claim.
        let pending = sqlx::query(
            "DELETE FROM pending_registration WHERE email = $1
             RETURNING email, name, password_hash",
        )
        .bind(email)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let Some(pending) = pending else {
            return Err(Error::NotFound(format!(
                "No pending registration for {}",
                email
            )));
        };

        let inserted = sqlx::query(
            "INSERT INTO user_account (email, name, password_hash, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO NOTHING
             RETURNING email, name, password_hash, created_at",
        )
        .bind(pending.get::<String, _>("email"))
        .bind(pending.get::<String, _>("name"))
        .bind(pending.get::<String, _>("password_hash"))
        .bind(created_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?;

        // Commit either way: the pending row is consumed even when the
        // account already exists.
        tx.commit().await.map_err(Error::Database)?;

        match inserted {
            Some(row) => {
                debug!(
                    subsystem = "database",
                    component = "pending",
                    op = "promote",
                    email = %email,
                    "Pending registration promoted"
                );
                Ok(crate::users::PgUserRepository::parse_row(&row))
            }
            None => {
                warn!(
                    subsystem = "database",
                    component = "pending",
                    op = "promote",
                    email = %email,
                    "Account already exists, pending registration discarded"
                );
                Err(Error::Conflict("User already exists".to_string()))
            }
        }
    }
}
