//! # kuppi-core
//!
//! Core types, traits, and abstractions for the Kuppi notes backend.
//!
//! This crate provides the domain models, error taxonomy, and the trait
//! seams (stores, OTP ledger, notifier, generation, OCR, clock) that the
//! other Kuppi crates implement or consume.

pub mod clock;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;
pub mod validation;

// Re-export commonly used types at crate root
pub use clock::{ManualClock, SystemClock};
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{new_v7, parse_id};
pub use validation::{normalize_email, require_field};
