//! Signup: stage the account, send a code, promote on confirmation.

use std::sync::Arc;

use chrono::Duration;
use tracing::{error, info};

use kuppi_core::{
    defaults, normalize_email, require_field, Clock, Error, PendingRegistration,
    PendingRegistrationRepository, Result, UserRepository,
};
use kuppi_crypto::{PasswordHashing, TokenSigner};

use super::{crypto_error, hash_password, AuthSession, OtpEngine};

pub struct RegistrationService {
    users: Arc<dyn UserRepository>,
    pending: Arc<dyn PendingRegistrationRepository>,
    engine: OtpEngine,
    hasher: PasswordHashing,
    tokens: Arc<TokenSigner>,
    clock: Arc<dyn Clock>,
}

impl RegistrationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        pending: Arc<dyn PendingRegistrationRepository>,
        engine: OtpEngine,
        hasher: PasswordHashing,
        tokens: Arc<TokenSigner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            pending,
            engine,
            hasher,
            tokens,
            clock,
        }
    }

    /// Stage a signup and email a confirmation code.
    ///
    /// The cooldown is checked before staging so a rate-limited retry leaves
    /// the earlier staged data untouched. If sending fails the staged signup
    /// is removed along with the code.
    pub async fn signup(&self, email: &str, name: Option<&str>, password: &str) -> Result<()> {
        let email = normalize_email(email)?;
        let password = require_field(Some(password), "password")?;
        let name = name.map(str::trim).unwrap_or_default().to_string();

        if self.users.exists(&email).await? {
            return Err(Error::Conflict("User already exists".to_string()));
        }
        self.engine.ensure_can_issue(&email).await?;

        let password_hash = hash_password(&self.hasher, password).await?;
        self.pending
            .upsert(PendingRegistration {
                email: email.clone(),
                name,
                password_hash,
                created_at: self.clock.now(),
            })
            .await?;

        if let Err(e) = self.engine.issue(&email).await {
            // A concurrent signup for this email issued the live code; its
            // confirmation needs the staged row.
            if !matches!(e, Error::RateLimited { .. }) {
                if let Err(cleanup) = self.pending.delete(&email).await {
                    error!(
                        subsystem = "auth",
                        component = "registration",
                        op = "signup",
                        email = %email,
                        error = %cleanup,
                        "Failed to remove pending registration"
                    );
                }
            }
            return Err(e);
        }

        info!(
            subsystem = "auth",
            component = "registration",
            op = "signup",
            email = %email,
            "Signup staged, confirmation code sent"
        );
        Ok(())
    }

    /// Verify the signup code and create the account.
    pub async fn confirm(&self, email: &str, code: &str) -> Result<AuthSession> {
        let email = normalize_email(email)?;
        let code = require_field(Some(code), "otp")?;

        self.engine.verify(&email, code).await?;
        let user = self.pending.promote(&email, self.clock.now()).await?;

        let issued = self
            .tokens
            .issue(
                &user.email,
                self.clock.now(),
                Duration::seconds(defaults::SIGNUP_TOKEN_TTL_SECS),
            )
            .map_err(crypto_error)?;

        info!(
            subsystem = "auth",
            component = "registration",
            op = "confirm",
            email = %email,
            "Account created"
        );
        Ok(AuthSession {
            token: issued.token,
            expires_at: issued.expires_at,
            user: user.profile(),
        })
    }
}
