//! Centralized default constants for the Kuppi backend.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic numbers.

// =============================================================================
// OTP LIFECYCLE
// =============================================================================

/// Minimum seconds between two OTP issuances for the same email and purpose.
pub const OTP_COOLDOWN_SECS: u64 = 60;

/// Seconds an issued OTP stays verifiable (10 minutes).
pub const OTP_EXPIRY_SECS: u64 = 600;

/// Failed verifications tolerated before the entry is discarded.
pub const OTP_MAX_ATTEMPTS: u32 = 3;

/// Number of decimal digits in an OTP.
pub const OTP_LENGTH: usize = 6;

/// Lifetime of the permission granted by a verified reset OTP.
pub const RESET_GRANT_TTL_SECS: u64 = 600;

// =============================================================================
// TOKENS
// =============================================================================

/// Bearer token lifetime for a login (24 hours).
pub const LOGIN_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Bearer token lifetime after confirming a signup (10 days).
pub const SIGNUP_TOKEN_TTL_SECS: i64 = 10 * 24 * 60 * 60;

/// Minimum length of the token signing secret in bytes.
pub const TOKEN_SECRET_MIN_BYTES: usize = 32;

// =============================================================================
// EXTERNAL COLLABORATORS
// =============================================================================

/// Timeout for a single mail relay request.
pub const MAIL_TIMEOUT_SECS: u64 = 10;

/// Default generative text model.
pub const GEN_MODEL: &str = "gemini-2.0-flash";

/// Default Gemini API base URL.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Timeout for a generation request.
pub const GEN_TIMEOUT_SECS: u64 = 60;

/// Default Tesseract language (Sinhala).
pub const OCR_LANGUAGE: &str = "sin";

/// Timeout for one OCR subprocess.
pub const OCR_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// SUMMARIZATION
// =============================================================================

/// Default summary length as a percentage of the input.
pub const SUMMARY_PERCENTAGE: u8 = 50;

/// Default summary style.
pub const SUMMARY_STYLE: &str = "casual";

// =============================================================================
// HTTP
// =============================================================================

/// Default listen port.
pub const PORT: u16 = 5000;

/// Maximum accepted request body (image uploads).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Requests allowed per rate-limit period.
pub const RATE_LIMIT_REQUESTS: u32 = 100;

/// Rate-limit period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;
