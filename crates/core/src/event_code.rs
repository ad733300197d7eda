//! Short event codes carried in join links (`/?event=CODE`).
//!
//! Generated codes avoid look-alike characters (`0/O`, `1/I`) so they can be
//! read off a printed card. Lookups are case-insensitive.

use rand::Rng;

use crate::error::CoreError;

/// Length of generated codes.
pub const CODE_LENGTH: usize = 6;

/// Accepted length range for admin-chosen codes.
pub const MIN_CODE_LENGTH: usize = 4;
pub const MAX_CODE_LENGTH: usize = 12;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a random event code.
pub fn generate_event_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Canonical form used for storage and lookup.
///
/// Returns `None` for input that can never match a stored code, so callers
/// can skip the lookup entirely.
pub fn normalize_event_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    let ok = (MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&code.len())
        && code.bytes().all(|b| b.is_ascii_alphanumeric());
    ok.then_some(code)
}

/// Validate an admin-chosen code and return its canonical form.
pub fn validate_event_code(raw: &str) -> Result<String, CoreError> {
    normalize_event_code(raw).ok_or_else(|| {
        CoreError::Validation(format!(
            "Event code must be {MIN_CODE_LENGTH}-{MAX_CODE_LENGTH} letters or digits"
        ))
    })
}
