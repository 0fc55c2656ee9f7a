//! Password reset: request a code, verify it, set a new password.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};

use kuppi_core::{
    normalize_email, require_field, Clock, Error, ResetGrantRepository, Result, UserRepository,
};
use kuppi_crypto::PasswordHashing;

use super::{hash_password, OtpEngine};

/// How a verified reset code authorizes the password change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantPolicy {
    /// Refuse `reset_password` without a fresh grant.
    pub required: bool,
    pub ttl_secs: u64,
}

pub struct PasswordResetService {
    users: Arc<dyn UserRepository>,
    grants: Arc<dyn ResetGrantRepository>,
    engine: OtpEngine,
    hasher: PasswordHashing,
    clock: Arc<dyn Clock>,
    grant_policy: GrantPolicy,
}

impl PasswordResetService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        grants: Arc<dyn ResetGrantRepository>,
        engine: OtpEngine,
        hasher: PasswordHashing,
        clock: Arc<dyn Clock>,
        grant_policy: GrantPolicy,
    ) -> Self {
        Self {
            users,
            grants,
            engine,
            hasher,
            clock,
            grant_policy,
        }
    }

    pub async fn request_reset(&self, email: &str) -> Result<()> {
        let email = normalize_email(email)?;
        if !self.users.exists(&email).await? {
            return Err(Error::UserNotFound(email));
        }
        self.engine.issue(&email).await
    }

    /// Verify the reset code and record a single-use grant.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<()> {
        let email = normalize_email(email)?;
        let code = require_field(Some(code), "otp")?;

        self.engine.verify(&email, code).await?;
        self.grants.grant(&email, self.clock.now()).await?;
        debug!(
            subsystem = "auth",
            component = "password_reset",
            op = "verify",
            email = %email,
            "Reset grant recorded"
        );
        Ok(())
    }

    /// Replace the password. Checks the account first, then the grant.
    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<()> {
        let email = normalize_email(email)?;
        let new_password = require_field(Some(new_password), "newPassword")?;

        if !self.users.exists(&email).await? {
            return Err(Error::UserNotFound(email));
        }

        let grant = self.grants.consume(&email).await?;
        if self.grant_policy.required {
            let granted_at = grant.ok_or_else(|| {
                Error::Forbidden("Verify the reset OTP before changing the password".to_string())
            })?;
            let age = self.clock.now() - granted_at;
            let ttl = Duration::seconds(i64::try_from(self.grant_policy.ttl_secs).unwrap_or(0));
            if age < Duration::zero() || age > ttl {
                return Err(Error::Forbidden(
                    "Password reset authorization has expired".to_string(),
                ));
            }
        }

        let password_hash = hash_password(&self.hasher, new_password).await?;
        if !self.users.update_password(&email, &password_hash).await? {
            return Err(Error::UserNotFound(email));
        }

        info!(
            subsystem = "auth",
            component = "password_reset",
            op = "reset",
            email = %email,
            "Password reset"
        );
        Ok(())
    }
}
