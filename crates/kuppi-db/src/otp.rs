//! OTP ledger stored in `otp_entry`, one row per `(purpose, email)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use kuppi_core::{Error, OtpEntry, OtpLedger, OtpPurpose, Result};

fn entry_from_row(row: &PgRow, purpose: OtpPurpose, email: &str) -> OtpEntry {
    OtpEntry {
        email: email.to_string(),
        purpose,
        code: row.get("code"),
        issued_at: row.get("issued_at"),
        attempts: row.get::<i32, _>("attempts").max(0) as u32,
    }
}

/// PostgreSQL OTP ledger.
pub struct PgOtpLedger {
    pool: Pool<Postgres>,
}

impl PgOtpLedger {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpLedger for PgOtpLedger {
    async fn get(&self, purpose: OtpPurpose, email: &str) -> Result<Option<OtpEntry>> {
        let row = sqlx::query(
            "SELECT code, issued_at, attempts FROM otp_entry WHERE purpose = $1 AND email = $2",
        )
        .bind(purpose.as_str())
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| entry_from_row(&r, purpose, email)))
    }

    async fn insert_if_cooled(
        &self,
        entry: OtpEntry,
        cooldown_start: DateTime<Utc>,
    ) -> Result<bool> {
        let attempts = i32::try_from(entry.attempts).unwrap_or(i32::MAX);
        // The conflict WHERE clause is evaluated under the row lock, so two
        // racing issues for one key cannot both replace the entry.
        let result = sqlx::query(
            "INSERT INTO otp_entry (purpose, email, code, issued_at, attempts)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (purpose, email) DO UPDATE
             SET code = EXCLUDED.code,
                 issued_at = EXCLUDED.issued_at,
                 attempts = EXCLUDED.attempts
             WHERE otp_entry.issued_at <= $6
                OR otp_entry.issued_at > EXCLUDED.issued_at",
        )
        .bind(entry.purpose.as_str())
        .bind(&entry.email)
        .bind(&entry.code)
        .bind(entry.issued_at)
        .bind(attempts)
        .bind(cooldown_start)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            debug!(
                subsystem = "database",
                component = "otp",
                op = "insert_if_cooled",
                purpose = %entry.purpose,
                "Live entry still inside cooldown"
            );
            return Ok(false);
        }
        Ok(true)
    }

    async fn claim_attempt(
        &self,
        purpose: OtpPurpose,
        email: &str,
        max_attempts: u32,
    ) -> Result<Option<OtpEntry>> {
        let row = sqlx::query(
            "UPDATE otp_entry SET attempts = attempts + 1
             WHERE purpose = $1 AND email = $2 AND attempts < $3
             RETURNING code, issued_at, attempts",
        )
        .bind(purpose.as_str())
        .bind(email)
        .bind(i32::try_from(max_attempts).unwrap_or(i32::MAX))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| entry_from_row(&r, purpose, email)))
    }

    async fn remove(&self, purpose: OtpPurpose, email: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM otp_entry WHERE purpose = $1 AND email = $2")
            .bind(purpose.as_str())
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
