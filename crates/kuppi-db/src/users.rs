//! Credential store backed by the `user_account` table.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use kuppi_core::{Error, Result, UserRecord, UserRepository};

/// PostgreSQL user repository.
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub(crate) fn parse_row(r: &sqlx::postgres::PgRow) -> UserRecord {
        UserRecord {
            email: r.get("email"),
            name: r.get("name"),
            password_hash: r.get("password_hash"),
            created_at: r.get("created_at"),
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT email, name, password_hash, created_at FROM user_account WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::parse_row))
    }

    async fn exists(&self, email: &str) -> Result<bool> {
        let found: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM user_account WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(found)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE user_account SET password_hash = $2 WHERE email = $1")
            .bind(email)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
