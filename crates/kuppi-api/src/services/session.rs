//! Login and bearer-token resolution.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};

use kuppi_core::{
    defaults, normalize_email, require_field, Clock, Error, PublicProfile, Result, UserRepository,
};
use kuppi_crypto::{PasswordHashing, TokenSigner};

use super::{crypto_error, verify_password, AuthSession};

/// Verified on the unknown-email path so it costs the same Argon2 work as a
/// wrong password.
const DUMMY_PASSWORD: &str = "kuppi-login-placeholder";

pub struct SessionService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHashing,
    tokens: Arc<TokenSigner>,
    clock: Arc<dyn Clock>,
    dummy_hash: Option<String>,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: PasswordHashing,
        tokens: Arc<TokenSigner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let dummy_hash = match hasher.hash(DUMMY_PASSWORD) {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!(
                    subsystem = "auth",
                    component = "session",
                    error = %e,
                    "Could not prepare placeholder hash for unknown logins"
                );
                None
            }
        };
        Self {
            users,
            hasher,
            tokens,
            clock,
            dummy_hash,
        }
    }

    /// Exchange credentials for a 24-hour token.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email)?;
        let password = require_field(Some(password), "password")?;
        let invalid = || Error::Unauthorized("Invalid credentials".to_string());

        let Some(user) = self.users.get(&email).await? else {
            if let Some(dummy) = &self.dummy_hash {
                // Outcome ignored; only the time spent matters.
                let _ = verify_password(&self.hasher, password, dummy).await;
            }
            debug!(
                subsystem = "auth",
                component = "session",
                op = "login",
                email = %email,
                "Unknown account"
            );
            return Err(invalid());
        };
        if !verify_password(&self.hasher, password, &user.password_hash).await? {
            debug!(
                subsystem = "auth",
                component = "session",
                op = "login",
                email = %email,
                "Password mismatch"
            );
            return Err(invalid());
        }

        let issued = self
            .tokens
            .issue(
                &user.email,
                self.clock.now(),
                Duration::seconds(defaults::LOGIN_TOKEN_TTL_SECS),
            )
            .map_err(crypto_error)?;

        info!(
            subsystem = "auth",
            component = "session",
            op = "login",
            email = %email,
            "Login succeeded"
        );
        Ok(AuthSession {
            token: issued.token,
            expires_at: issued.expires_at,
            user: user.profile(),
        })
    }

    /// Resolve a bearer token to the email it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<String> {
        let claims = self
            .tokens
            .verify(token, self.clock.now())
            .map_err(crypto_error)?;
        Ok(claims.sub)
    }

    /// Public profile of the account behind `email`.
    pub async fn profile(&self, email: &str) -> Result<PublicProfile> {
        self.users
            .get(email)
            .await?
            .map(|u| u.profile())
            .ok_or_else(|| Error::UserNotFound(email.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::hash_password;
    use kuppi_core::{ManualClock, UserRecord};
    use kuppi_crypto::KdfParams;
    use kuppi_db::MemoryStore;

    const SECRET: &[u8] = b"session-test-secret-of-32-bytes!";

    async fn service_with_user() -> (SessionService, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let hasher = PasswordHashing::new(&KdfParams::insecure_fast()).unwrap();
        store
            .seed_user(UserRecord {
                email: "alice@example.com".into(),
                name: "Alice".into(),
                password_hash: hash_password(&hasher, "hunter2").await.unwrap(),
                created_at: clock.now(),
            })
            .await;
        let service = SessionService::new(
            store,
            hasher,
            Arc::new(TokenSigner::new(SECRET).unwrap()),
            clock.clone(),
        );
        (service, clock)
    }

    #[tokio::test]
    async fn test_login_issues_day_long_token() {
        let (service, clock) = service_with_user().await;
        let session = service.login("ALICE@example.com", "hunter2").await.unwrap();

        assert_eq!(session.user.name, "Alice");
        assert_eq!(
            session.expires_at,
            clock.now() + Duration::seconds(defaults::LOGIN_TOKEN_TTL_SECS)
        );
        assert_eq!(
            service.authenticate(&session.token).unwrap(),
            "alice@example.com"
        );
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let (service, _) = service_with_user().await;
        let wrong = service
            .login("alice@example.com", "nope")
            .await
            .unwrap_err();
        let unknown = service
            .login("mallory@example.com", "hunter2")
            .await
            .unwrap_err();
        assert!(matches!(wrong, Error::Unauthorized(_)));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_unknown_user_pays_for_a_hash_check() {
        let (service, _) = service_with_user().await;
        let dummy = service.dummy_hash.as_deref().unwrap();
        assert!(dummy.starts_with("$argon2id$"));
        assert!(verify_password(&service.hasher, DUMMY_PASSWORD, dummy)
            .await
            .unwrap());

        // Matching the placeholder never logs anyone in.
        assert!(matches!(
            service.login("ghost@example.com", DUMMY_PASSWORD).await,
            Err(Error::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_token_stops_authenticating_after_expiry() {
        let (service, clock) = service_with_user().await;
        let session = service.login("alice@example.com", "hunter2").await.unwrap();

        clock.advance_secs(defaults::LOGIN_TOKEN_TTL_SECS);
        assert!(matches!(
            service.authenticate(&session.token),
            Err(Error::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_of_missing_user_is_not_found() {
        let (service, _) = service_with_user().await;
        assert!(matches!(
            service.profile("ghost@example.com").await,
            Err(Error::UserNotFound(_))
        ));
        assert_eq!(
            service.profile("alice@example.com").await.unwrap().name,
            "Alice"
        );
    }
}
