//! Request field validation shared by the HTTP handlers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Trim and lower-case an email, rejecting anything that is not
/// shaped like `local@domain.tld`.
pub fn normalize_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(Error::InvalidInput("Email is required".to_string()));
    }
    if !EMAIL_RE.is_match(&email) {
        return Err(Error::InvalidInput(format!("Invalid email address: {}", raw.trim())));
    }
    Ok(email)
}

/// Return the field value, or `InvalidInput` naming the field when it is
/// absent or blank.
pub fn require_field<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::InvalidInput(format!("{} is required", name))),
    }
}
