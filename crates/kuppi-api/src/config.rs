//! Server configuration read from the environment.
//!
//! Every variable has a default except `JWT_SECRET_KEY`. Values that are
//! present but unparseable are startup errors rather than silent fallbacks.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use governor::{Quota, RateLimiter};

use kuppi_core::{defaults, Error, Result};

use crate::services::otp::OtpPolicy;
use crate::state::GlobalRateLimiter;

/// Which store implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(Error::Config(format!(
                "STORE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

/// HTTP mail relay settings. Sending is disabled while `api_url` is unset.
#[derive(Clone, Default)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: Option<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("from", &self.from)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests: u32,
    pub period_secs: u64,
}

impl RateLimitConfig {
    /// Build the shared limiter: `requests` burst, refilled evenly over
    /// `period_secs`. `None` when disabled.
    pub fn build_limiter(&self) -> Option<GlobalRateLimiter> {
        if !self.enabled {
            return None;
        }
        let burst = NonZeroU32::new(self.requests)?;
        let refill = Duration::from_secs(self.period_secs) / self.requests;
        let quota = Quota::with_period(refill)?.allow_burst(burst);
        Some(RateLimiter::direct(quota))
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: defaults::RATE_LIMIT_REQUESTS,
            period_secs: defaults::RATE_LIMIT_PERIOD_SECS,
        }
    }
}

/// Complete server configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub jwt_secret: String,
    pub otp: OtpPolicy,
    pub reset_require_grant: bool,
    pub reset_grant_ttl_secs: u64,
    pub mail: MailConfig,
    pub ocr_default_lang: String,
    pub allowed_origins: Vec<String>,
    pub rate_limit: RateLimitConfig,
    pub max_upload_bytes: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("store_backend", &self.store_backend)
            .field("jwt_secret", &"[REDACTED]")
            .field("otp", &self.otp)
            .field("reset_require_grant", &self.reset_require_grant)
            .field("mail", &self.mail)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit", &self.rate_limit)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish_non_exhaustive()
    }
}

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:8081,http://localhost:19006";

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration from a fixed map (tests, embedding).
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET_KEY")
            .ok_or_else(|| Error::Config("JWT_SECRET_KEY is required".to_string()))?;
        if jwt_secret.len() < defaults::TOKEN_SECRET_MIN_BYTES {
            return Err(Error::Config(format!(
                "JWT_SECRET_KEY must be at least {} bytes",
                defaults::TOKEN_SECRET_MIN_BYTES
            )));
        }

        let otp = OtpPolicy {
            cooldown_secs: parse_or(&get, "OTP_COOLDOWN_SECS", defaults::OTP_COOLDOWN_SECS)?,
            expiry_secs: parse_or(&get, "OTP_EXPIRY_SECS", defaults::OTP_EXPIRY_SECS)?,
            max_attempts: parse_or(&get, "OTP_MAX_ATTEMPTS", defaults::OTP_MAX_ATTEMPTS)?,
            code_length: parse_or(&get, "OTP_LENGTH", defaults::OTP_LENGTH)?,
        };
        if otp.code_length == 0 || otp.max_attempts == 0 {
            return Err(Error::Config(
                "OTP_LENGTH and OTP_MAX_ATTEMPTS must be positive".to_string(),
            ));
        }

        let allowed_origins = get("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let rate_limit = RateLimitConfig {
            enabled: parse_bool(&get, "RATE_LIMIT_ENABLED", true),
            requests: parse_or(&get, "RATE_LIMIT_REQUESTS", defaults::RATE_LIMIT_REQUESTS)?,
            period_secs: parse_or(
                &get,
                "RATE_LIMIT_PERIOD_SECS",
                defaults::RATE_LIMIT_PERIOD_SECS,
            )?,
        };
        if rate_limit.enabled && (rate_limit.requests == 0 || rate_limit.period_secs == 0) {
            return Err(Error::Config(
                "RATE_LIMIT_REQUESTS and RATE_LIMIT_PERIOD_SECS must be positive".to_string(),
            ));
        }

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", defaults::PORT)?,
            store_backend: match get("STORE_BACKEND") {
                Some(raw) => raw.parse()?,
                None => StoreBackend::Postgres,
            },
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost/kuppi".to_string()),
            jwt_secret,
            otp,
            reset_require_grant: parse_bool(&get, "RESET_REQUIRE_GRANT", true),
            reset_grant_ttl_secs: parse_or(
                &get,
                "RESET_GRANT_TTL_SECS",
                defaults::RESET_GRANT_TTL_SECS,
            )?,
            mail: MailConfig {
                api_url: get("MAIL_API_URL"),
                api_key: get("MAIL_API_KEY"),
                from: get("MAIL_FROM"),
                timeout_secs: parse_or(&get, "MAIL_TIMEOUT_SECS", defaults::MAIL_TIMEOUT_SECS)?,
            },
            ocr_default_lang: get("OCR_DEFAULT_LANG")
                .unwrap_or_else(|| defaults::OCR_LANGUAGE.to_string()),
            allowed_origins,
            rate_limit,
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", defaults::MAX_UPLOAD_BYTES)?,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", key, raw))),
        None => Ok(default),
    }
}

fn parse_bool<G>(get: &G, key: &str, default: bool) -> bool
where
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|v| matches!(v.trim(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_map(&vars(&[("JWT_SECRET_KEY", SECRET)])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.otp, OtpPolicy::default());
        assert!(config.reset_require_grant);
        assert!(config.mail.api_url.is_none());
        assert_eq!(config.ocr_default_lang, "sin");
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:8081", "http://localhost:19006"]
        );
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_secret_required_and_long_enough() {
        assert!(matches!(
            AppConfig::from_map(&HashMap::new()),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_map(&vars(&[("JWT_SECRET_KEY", "short")])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_map(&vars(&[
            ("JWT_SECRET_KEY", SECRET),
            ("PORT", "8080"),
            ("STORE_BACKEND", "memory"),
            ("OTP_COOLDOWN_SECS", "30"),
            ("OTP_LENGTH", "8"),
            ("RESET_REQUIRE_GRANT", "false"),
            ("RATE_LIMIT_ENABLED", "0"),
            ("ALLOWED_ORIGINS", "https://kuppi.app, ,https://admin.kuppi.app"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.otp.cooldown_secs, 30);
        assert_eq!(config.otp.code_length, 8);
        assert!(!config.reset_require_grant);
        assert!(!config.rate_limit.enabled);
        assert_eq!(
            config.allowed_origins,
            vec!["https://kuppi.app", "https://admin.kuppi.app"]
        );
    }

    #[test]
    fn test_invalid_number_is_error() {
        let result = AppConfig::from_map(&vars(&[
            ("JWT_SECRET_KEY", SECRET),
            ("OTP_EXPIRY_SECS", "ten minutes"),
        ]));
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("OTP_EXPIRY_SECS")));
    }

    #[test]
    fn test_unknown_store_backend() {
        let result = AppConfig::from_map(&vars(&[
            ("JWT_SECRET_KEY", SECRET),
            ("STORE_BACKEND", "mongodb"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rate_limiter_follows_config() {
        let enabled = RateLimitConfig {
            enabled: true,
            requests: 2,
            period_secs: 60,
        };
        let limiter = enabled.build_limiter().unwrap();
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());

        let disabled = RateLimitConfig {
            enabled: false,
            ..enabled
        };
        assert!(disabled.build_limiter().is_none());
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let result = AppConfig::from_map(&vars(&[
            ("JWT_SECRET_KEY", SECRET),
            ("RATE_LIMIT_REQUESTS", "0"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AppConfig::from_map(&vars(&[
            ("JWT_SECRET_KEY", SECRET),
            ("MAIL_API_KEY", "mail-secret"),
        ]))
        .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains(SECRET));
        assert!(!debug.contains("mail-secret"));
    }
}
