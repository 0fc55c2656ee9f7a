//! UUID v7 utilities for time-ordered identifiers.
//!
//! Note ids are UUIDv7 so that sorting by id matches creation order.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Parse a client-supplied id, rejecting malformed input as `InvalidInput`.
pub fn parse_id(raw: &str) -> crate::Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| crate::Error::InvalidInput(format!("Malformed id: {}", raw)))
}
