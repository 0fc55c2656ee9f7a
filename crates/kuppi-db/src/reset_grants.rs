//! Single-use password change grants.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use kuppi_core::{Error, ResetGrantRepository, Result};

/// PostgreSQL reset grant repository.
pub struct PgResetGrantRepository {
    pool: Pool<Postgres>,
}

impl PgResetGrantRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResetGrantRepository for PgResetGrantRepository {
    async fn grant(&self, email: &str, granted_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "INSERT INTO reset_grant (email, granted_at) VALUES ($1, $2)
             ON CONFLICT (email) DO UPDATE SET granted_at = EXCLUDED.granted_at",
        )
        .bind(email)
        .bind(granted_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn consume(&self, email: &str) -> Result<Option<DateTime<Utc>>> {
        let granted_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("DELETE FROM reset_grant WHERE email = $1 RETURNING granted_at")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(granted_at)
    }
}
