//! Access code generation.
//!
//! Codes are typed by hand, so the alphabet drops the glyphs people confuse
//! (O/0, I/1, L). Characters come from the thread-local CSPRNG.

use rand::Rng;

/// Uppercase letters and digits without `O`, `0`, `I`, `1` and `L` (31 symbols).
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub const DEFAULT_CODE_LENGTH: usize = 8;

/// Draw `length` characters uniformly from [`CODE_ALPHABET`].
///
/// Uniqueness is not checked here; the access code repository rejects and retries
/// on collision at insertion time.
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Normalize user input before lookup: codes are stored uppercase.
pub fn normalize_code(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Loggable form of a code: the first two characters, the rest masked.
pub fn redact_code(code: &str) -> String {
    let prefix: String = code.trim().chars().take(2).collect();
    format!("{}***", prefix)
}
