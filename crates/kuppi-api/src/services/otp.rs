//! OTP lifecycle engine.
//!
//! One engine type serves both ledgers; each instance is bound to an
//! [`OtpPurpose`] and never reads or writes the other purpose's entries.
//!
//! Entry states: `absent -> issued -> absent` via consumption, expiry or
//! exhaustion. Every verification spends one attempt before the code is
//! compared, so a wrong code keeps the entry issued with one more attempt
//! recorded. Expiry is evaluated lazily on `verify`; nothing sweeps.
//!
//! The cooldown and attempt checks are enforced by the ledger in the same
//! step as the write, so concurrent requests cannot both pass them.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

use kuppi_core::{defaults, Clock, Error, Notifier, OtpEntry, OtpLedger, OtpPurpose, Result};
use kuppi_crypto::{codes_match, generate_numeric_code};

use super::templates::render_otp_message;

/// Timing and size limits for one ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    /// Minimum seconds between two issues for the same email.
    pub cooldown_secs: u64,
    /// Seconds after issue during which a code verifies.
    pub expiry_secs: u64,
    /// Wrong guesses allowed before the entry is discarded.
    pub max_attempts: u32,
    pub code_length: usize,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            cooldown_secs: defaults::OTP_COOLDOWN_SECS,
            expiry_secs: defaults::OTP_EXPIRY_SECS,
            max_attempts: defaults::OTP_MAX_ATTEMPTS,
            code_length: defaults::OTP_LENGTH,
        }
    }
}

fn secs(value: u64) -> Duration {
    Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX / 1000))
}

/// Issues and verifies codes for one purpose.
pub struct OtpEngine {
    purpose: OtpPurpose,
    policy: OtpPolicy,
    ledger: Arc<dyn OtpLedger>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl OtpEngine {
    pub fn new(
        purpose: OtpPurpose,
        policy: OtpPolicy,
        ledger: Arc<dyn OtpLedger>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            purpose,
            policy,
            ledger,
            notifier,
            clock,
        }
    }

    pub fn purpose(&self) -> OtpPurpose {
        self.purpose
    }

    pub fn policy(&self) -> &OtpPolicy {
        &self.policy
    }

    fn retry_after(&self, issued_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<u64> {
        let elapsed = now - issued_at;
        let cooldown = secs(self.policy.cooldown_secs);
        if elapsed >= Duration::zero() && elapsed < cooldown {
            let remaining_ms = (cooldown - elapsed).num_milliseconds();
            Some(((remaining_ms + 999) / 1000).max(1) as u64)
        } else {
            None
        }
    }

    fn rate_limited(&self, email: &str, retry_after_secs: u64) -> Error {
        debug!(
            subsystem = "auth",
            component = "otp_engine",
            op = "issue",
            purpose = %self.purpose,
            email = %email,
            retry_after_secs,
            "OTP requested inside cooldown"
        );
        Error::RateLimited { retry_after_secs }
    }

    /// Fail with `RateLimited` while a live entry is inside its cooldown.
    ///
    /// An entry stamped in the future counts as outside the cooldown. This
    /// is a fast pre-check; `issue` enforces the cooldown again atomically.
    pub async fn ensure_can_issue(&self, email: &str) -> Result<()> {
        let Some(entry) = self.ledger.get(self.purpose, email).await? else {
            return Ok(());
        };
        match self.retry_after(entry.issued_at, self.clock.now()) {
            Some(retry_after_secs) => Err(self.rate_limited(email, retry_after_secs)),
            None => Ok(()),
        }
    }

    /// Generate a code, store it, and send it to `email`.
    ///
    /// Returns `RateLimited` without sending anything when another issue
    /// for the same email is still cooling down, including one that landed
    /// concurrently. Any failure after the entry is stored removes it again
    /// before the error is returned, so a failed send never leaves a usable
    /// code behind.
    pub async fn issue(&self, email: &str) -> Result<()> {
        self.ensure_can_issue(email).await?;

        let now = self.clock.now();
        let code = generate_numeric_code(self.policy.code_length);
        let entry = OtpEntry::issue(email, self.purpose, code, now);
        let message = render_otp_message(self.purpose, &entry.code, self.policy.expiry_secs);

        let cooldown_start = now - secs(self.policy.cooldown_secs);
        if !self.ledger.insert_if_cooled(entry, cooldown_start).await? {
            let retry_after_secs = self
                .ledger
                .get(self.purpose, email)
                .await?
                .and_then(|live| self.retry_after(live.issued_at, now))
                .unwrap_or(self.policy.cooldown_secs.max(1));
            return Err(self.rate_limited(email, retry_after_secs));
        }

        if let Err(e) = self
            .notifier
            .send(email, &message.subject, &message.html)
            .await
        {
            warn!(
                subsystem = "auth",
                component = "otp_engine",
                op = "issue",
                purpose = %self.purpose,
                email = %email,
                error = %e,
                "OTP delivery failed, discarding entry"
            );
            self.discard(email).await;
            return Err(match e {
                Error::NotificationFailed(_) => e,
                other => Error::NotificationFailed(other.to_string()),
            });
        }

        info!(
            subsystem = "auth",
            component = "otp_engine",
            op = "issue",
            purpose = %self.purpose,
            email = %email,
            "OTP issued"
        );
        Ok(())
    }

    /// Check `supplied` against the live entry for `email`.
    ///
    /// Success consumes the entry, so each code verifies at most once.
    pub async fn verify(&self, email: &str, supplied: &str) -> Result<()> {
        let entry = self
            .ledger
            .get(self.purpose, email)
            .await?
            .ok_or(Error::OtpNotFound)?;

        let elapsed = self.clock.now() - entry.issued_at;
        if elapsed < Duration::zero() || elapsed > secs(self.policy.expiry_secs) {
            self.ledger.remove(self.purpose, email).await?;
            debug!(
                subsystem = "auth",
                component = "otp_engine",
                op = "verify",
                purpose = %self.purpose,
                email = %email,
                elapsed_secs = elapsed.num_seconds(),
                "OTP expired"
            );
            return Err(Error::OtpExpired);
        }

        // The attempt is spent before the comparison; only a claimed entry
        // is ever compared against the supplied code.
        let Some(claimed) = self
            .ledger
            .claim_attempt(self.purpose, email, self.policy.max_attempts)
            .await?
        else {
            if !self.ledger.remove(self.purpose, email).await? {
                return Err(Error::OtpNotFound);
            }
            debug!(
                subsystem = "auth",
                component = "otp_engine",
                op = "verify",
                purpose = %self.purpose,
                email = %email,
                "OTP attempts exhausted"
            );
            return Err(Error::TooManyAttempts);
        };

        if !codes_match(supplied, &claimed.code) {
            debug!(
                subsystem = "auth",
                component = "otp_engine",
                op = "verify",
                purpose = %self.purpose,
                email = %email,
                attempts = claimed.attempts,
                "OTP mismatch"
            );
            return Err(Error::InvalidCode);
        }

        // A concurrent verify may have consumed it first; only one wins.
        if !self.ledger.remove(self.purpose, email).await? {
            return Err(Error::OtpNotFound);
        }
        debug!(
            subsystem = "auth",
            component = "otp_engine",
            op = "verify",
            purpose = %self.purpose,
            email = %email,
            "OTP verified"
        );
        Ok(())
    }

    /// Best-effort removal used on cleanup paths.
    pub(crate) async fn discard(&self, email: &str) {
        if let Err(e) = self.ledger.remove(self.purpose, email).await {
            error!(
                subsystem = "auth",
                component = "otp_engine",
                purpose = %self.purpose,
                email = %email,
                error = %e,
                "Failed to discard OTP entry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifier::RecordingNotifier;
    use kuppi_core::ManualClock;
    use kuppi_db::MemoryStore;

    struct Harness {
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        clock: Arc<ManualClock>,
        engine: OtpEngine,
    }

    fn harness(purpose: OtpPurpose) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualClock::default());
        let engine = OtpEngine::new(
            purpose,
            OtpPolicy::default(),
            store.clone(),
            notifier.clone(),
            clock.clone(),
        );
        Harness {
            store,
            notifier,
            clock,
            engine,
        }
    }

    /// Delegates to a [`MemoryStore`] but yields for a few milliseconds on
    /// every read, the way a database round-trip would.
    struct SlowLedger {
        store: Arc<MemoryStore>,
    }

    #[async_trait::async_trait]
    impl OtpLedger for SlowLedger {
        async fn get(&self, purpose: OtpPurpose, email: &str) -> Result<Option<OtpEntry>> {
            let entry = OtpLedger::get(self.store.as_ref(), purpose, email).await;
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            entry
        }

        async fn insert_if_cooled(
            &self,
            entry: OtpEntry,
            cooldown_start: DateTime<Utc>,
        ) -> Result<bool> {
            self.store.insert_if_cooled(entry, cooldown_start).await
        }

        async fn claim_attempt(
            &self,
            purpose: OtpPurpose,
            email: &str,
            max_attempts: u32,
        ) -> Result<Option<OtpEntry>> {
            self.store.claim_attempt(purpose, email, max_attempts).await
        }

        async fn remove(&self, purpose: OtpPurpose, email: &str) -> Result<bool> {
            self.store.remove(purpose, email).await
        }
    }

    fn slow_harness(purpose: OtpPurpose) -> (Harness, Arc<OtpEngine>) {
        let h = harness(purpose);
        let engine = Arc::new(OtpEngine::new(
            purpose,
            OtpPolicy::default(),
            Arc::new(SlowLedger {
                store: h.store.clone(),
            }),
            h.notifier.clone(),
            h.clock.clone(),
        ));
        (h, engine)
    }

    async fn live_code(h: &Harness, email: &str) -> String {
        OtpLedger::get(h.store.as_ref(), h.engine.purpose(), email)
            .await
            .unwrap()
            .expect("entry should exist")
            .code
    }

    #[tokio::test]
    async fn test_issue_stores_entry_and_sends_code() {
        let h = harness(OtpPurpose::Signup);
        h.engine.issue("a@x.com").await.unwrap();

        let code = live_code(&h, "a@x.com").await;
        assert_eq!(code.len(), 6);
        let message = h.notifier.last_to("a@x.com").unwrap();
        assert!(message.html.contains(&code));
    }

    #[tokio::test]
    async fn test_cooldown_rejects_second_issue() {
        let h = harness(OtpPurpose::Signup);
        h.engine.issue("a@x.com").await.unwrap();
        let first = live_code(&h, "a@x.com").await;

        h.clock.advance_secs(10);
        assert!(matches!(
            h.engine.issue("a@x.com").await,
            Err(Error::RateLimited { retry_after_secs: 50 })
        ));
        // No new code and no second message.
        assert_eq!(live_code(&h, "a@x.com").await, first);
        assert_eq!(h.notifier.sent().len(), 1);

        h.clock.advance_secs(50);
        h.engine.issue("a@x.com").await.unwrap();
        assert_eq!(h.notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_notification_failure_discards_entry() {
        let h = harness(OtpPurpose::PasswordReset);
        h.notifier.set_failing(true);

        assert!(matches!(
            h.engine.issue("a@x.com").await,
            Err(Error::NotificationFailed(_))
        ));
        assert_eq!(h.store.otp_count().await, 0);

        // Cleanup also lifts the cooldown.
        h.notifier.set_failing(false);
        h.engine.issue("a@x.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_verify_success_is_single_use() {
        let h = harness(OtpPurpose::Signup);
        h.engine.issue("a@x.com").await.unwrap();
        let code = live_code(&h, "a@x.com").await;

        h.engine.verify("a@x.com", &code).await.unwrap();
        assert!(matches!(
            h.engine.verify("a@x.com", &code).await,
            Err(Error::OtpNotFound)
        ));
    }

    #[tokio::test]
    async fn test_verify_without_entry() {
        let h = harness(OtpPurpose::Signup);
        assert!(matches!(
            h.engine.verify("a@x.com", "123456").await,
            Err(Error::OtpNotFound)
        ));
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let h = harness(OtpPurpose::Signup);
        h.engine.issue("a@x.com").await.unwrap();
        let code = live_code(&h, "a@x.com").await;

        h.clock.advance_secs(600);
        h.engine.verify("a@x.com", &code).await.unwrap();

        h.clock.advance_secs(60);
        h.engine.issue("a@x.com").await.unwrap();
        let code = live_code(&h, "a@x.com").await;
        h.clock.advance_secs(601);
        assert!(matches!(
            h.engine.verify("a@x.com", &code).await,
            Err(Error::OtpExpired)
        ));
        assert_eq!(h.store.otp_count().await, 0);
    }

    #[tokio::test]
    async fn test_attempt_limit() {
        let h = harness(OtpPurpose::Signup);
        h.engine.issue("a@x.com").await.unwrap();
        let code = live_code(&h, "a@x.com").await;
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for expected_attempts in 1..=3u32 {
            assert!(matches!(
                h.engine.verify("a@x.com", wrong).await,
                Err(Error::InvalidCode)
            ));
            let entry = OtpLedger::get(h.store.as_ref(), OtpPurpose::Signup, "a@x.com")
                .await
                .unwrap()
                .unwrap();
            assert_eq!(entry.attempts, expected_attempts);
        }

        // The correct code no longer helps once the budget is spent.
        assert!(matches!(
            h.engine.verify("a@x.com", &code).await,
            Err(Error::TooManyAttempts)
        ));
        assert_eq!(h.store.otp_count().await, 0);
    }

    #[tokio::test]
    async fn test_future_issued_at_fails_closed() {
        let h = harness(OtpPurpose::Signup);
        let now = h.clock.now();
        h.store
            .insert_if_cooled(
                OtpEntry::issue(
                    "a@x.com",
                    OtpPurpose::Signup,
                    "123456".into(),
                    now + Duration::minutes(5),
                ),
                now,
            )
            .await
            .unwrap();

        // Outside the cooldown, so a new code can be issued ...
        h.engine.ensure_can_issue("a@x.com").await.unwrap();
        // ... and the skewed entry never verifies.
        assert!(matches!(
            h.engine.verify("a@x.com", "123456").await,
            Err(Error::OtpExpired)
        ));
    }

    #[tokio::test]
    async fn test_engines_do_not_share_entries() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualClock::default());
        let signup = OtpEngine::new(
            OtpPurpose::Signup,
            OtpPolicy::default(),
            store.clone(),
            notifier.clone(),
            clock.clone(),
        );
        let reset = OtpEngine::new(
            OtpPurpose::PasswordReset,
            OtpPolicy::default(),
            store.clone(),
            notifier.clone(),
            clock.clone(),
        );

        signup.issue("a@x.com").await.unwrap();
        let signup_code = OtpLedger::get(store.as_ref(), OtpPurpose::Signup, "a@x.com")
            .await
            .unwrap()
            .unwrap()
            .code;

        // Reset has its own cooldown and no entry of its own yet.
        assert!(matches!(
            reset.verify("a@x.com", &signup_code).await,
            Err(Error::OtpNotFound)
        ));
        reset.issue("a@x.com").await.unwrap();
        assert_eq!(store.otp_count().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_wrong_guesses_respect_attempt_budget() {
        let (h, engine) = slow_harness(OtpPurpose::Signup);
        engine.issue("a@x.com").await.unwrap();
        let code = live_code(&h, "a@x.com").await;
        let wrong = if code == "000000" { "111111" } else { "000000" };

        let mut handles = Vec::new();
        for _ in 0..200 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine.verify("a@x.com", wrong).await
            }));
        }

        let mut compared = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Err(Error::InvalidCode) => compared += 1,
                Err(Error::TooManyAttempts) | Err(Error::OtpNotFound) => {}
                other => panic!("unexpected verify outcome: {:?}", other),
            }
        }
        assert_eq!(compared, OtpPolicy::default().max_attempts);
        assert_eq!(h.store.otp_count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_issues_send_one_code() {
        let (h, engine) = slow_harness(OtpPurpose::PasswordReset);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move { engine.issue("a@x.com").await }));
        }

        let mut issued = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => issued += 1,
                Err(Error::RateLimited { retry_after_secs }) => {
                    assert_eq!(retry_after_secs, 60)
                }
                other => panic!("unexpected issue outcome: {:?}", other),
            }
        }
        assert_eq!(issued, 1);
        assert_eq!(h.notifier.sent().len(), 1);
        let code = live_code(&h, "a@x.com").await;
        assert!(h.notifier.sent()[0].html.contains(&code));
    }

    #[tokio::test]
    async fn test_correct_code_spends_an_attempt_before_consuming() {
        let h = harness(OtpPurpose::Signup);
        h.engine.issue("a@x.com").await.unwrap();
        let code = live_code(&h, "a@x.com").await;
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for _ in 0..2 {
            assert!(matches!(
                h.engine.verify("a@x.com", wrong).await,
                Err(Error::InvalidCode)
            ));
        }
        // The last attempt in the budget still verifies.
        h.engine.verify("a@x.com", &code).await.unwrap();
        assert_eq!(h.store.otp_count().await, 0);
    }
}
