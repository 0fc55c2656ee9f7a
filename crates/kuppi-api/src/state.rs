//! Shared application state handed to every handler.

use std::sync::Arc;

use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, RateLimiter};

use kuppi_core::{Clock, GenerationBackend, Notifier, OcrEngine, OtpPurpose};
use kuppi_crypto::{PasswordHashing, TokenSigner};
use kuppi_db::Stores;

use crate::config::AppConfig;
use crate::services::password_reset::GrantPolicy;
use crate::services::{
    NotesService, OtpEngine, PasswordResetService, RegistrationService, SessionService,
};

/// Type alias for the global rate limiter.
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// External collaborators the services depend on.
#[derive(Clone)]
pub struct Collaborators {
    pub notifier: Arc<dyn Notifier>,
    pub generator: Arc<dyn GenerationBackend>,
    pub ocr: Arc<dyn OcrEngine>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<RegistrationService>,
    pub sessions: Arc<SessionService>,
    pub password_reset: Arc<PasswordResetService>,
    pub notes: Arc<NotesService>,
    pub generator: Arc<dyn GenerationBackend>,
    pub ocr: Arc<dyn OcrEngine>,
    pub ocr_default_lang: String,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    /// Wire services over `stores` according to `config`.
    pub fn build(
        config: &AppConfig,
        stores: Stores,
        collaborators: Collaborators,
        hasher: PasswordHashing,
        tokens: Arc<TokenSigner>,
    ) -> Self {
        let Collaborators {
            notifier,
            generator,
            ocr,
            clock,
        } = collaborators;

        let engine = |purpose| {
            OtpEngine::new(
                purpose,
                config.otp,
                stores.otp.clone(),
                notifier.clone(),
                clock.clone(),
            )
        };

        let registration = RegistrationService::new(
            stores.users.clone(),
            stores.pending.clone(),
            engine(OtpPurpose::Signup),
            hasher.clone(),
            tokens.clone(),
            clock.clone(),
        );
        let sessions =
            SessionService::new(stores.users.clone(), hasher.clone(), tokens, clock.clone());
        let password_reset = PasswordResetService::new(
            stores.users.clone(),
            stores.reset_grants.clone(),
            engine(OtpPurpose::PasswordReset),
            hasher,
            clock.clone(),
            GrantPolicy {
                required: config.reset_require_grant,
                ttl_secs: config.reset_grant_ttl_secs,
            },
        );

        let rate_limiter = config.rate_limit.build_limiter().map(Arc::new);

        Self {
            registration: Arc::new(registration),
            sessions: Arc::new(sessions),
            password_reset: Arc::new(password_reset),
            notes: Arc::new(NotesService::new(stores.notes.clone(), clock)),
            generator,
            ocr,
            ocr_default_lang: config.ocr_default_lang.clone(),
            rate_limiter,
        }
    }
}
