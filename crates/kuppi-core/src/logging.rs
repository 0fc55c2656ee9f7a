//! Structured logging field name constants.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, compensating cleanup applied |
//! | INFO  | Lifecycle events (startup, signup confirmed, password reset) |
//! | DEBUG | Decision points (cooldown hit, code mismatch) |
//! | TRACE | Store-level reads and writes |
//!
//! OTP codes, passwords, hashes and bearer tokens are never logged.

/// Correlation ID propagated from the `x-request-id` header.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "auth", "database", "inference", "ocr", "mail"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "otp_engine", "registration", "pool", "gemini"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "issue", "verify", "promote", "generate"
pub const OPERATION: &str = "op";

/// Email the operation concerns.
pub const EMAIL: &str = "email";

/// OTP ledger purpose ("signup" or "password_reset").
pub const PURPOSE: &str = "purpose";

/// Failed verification count.
pub const ATTEMPTS: &str = "attempts";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";
