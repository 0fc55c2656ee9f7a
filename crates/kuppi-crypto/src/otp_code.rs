//! One-time numeric codes.

use rand::Rng;
use subtle::ConstantTimeEq;

/// Generate a code of `length` decimal digits, each drawn uniformly.
///
/// Leading zeros are kept, so every code has exactly `length` characters.
pub fn generate_numeric_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Compare a supplied code with the stored one without leaking timing.
pub fn codes_match(supplied: &str, stored: &str) -> bool {
    let supplied = supplied.trim().as_bytes();
    let stored = stored.as_bytes();
    if supplied.len() != stored.len() {
        return false;
    }
    supplied.ct_eq(stored).into()
}
