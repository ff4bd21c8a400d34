//! Confirmation codes
//!
//! Eight characters from an alphabet without look-alikes (no `I`, `O`, `0`,
//! `1`), compared case-insensitively.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LENGTH: usize = 8;

/// Normalized (upper-case) confirmation code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationCode(String);

impl ConfirmationCode {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let code: String = (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Normalize user input for lookup. Surrounding whitespace is dropped.
    pub fn parse(input: &str) -> Self {
        Self(input.trim().to_ascii_uppercase())
    }

    /// Whether the code has the shape of a generated one.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == CODE_LENGTH && self.0.bytes().all(|b| CODE_ALPHABET.contains(&b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ConfirmationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_well_formed() {
        for _ in 0..200 {
            let code = ConfirmationCode::generate();
            assert!(code.is_well_formed(), "bad code {}", code);
        }
    }

    #[test]
    fn alphabet_has_no_lookalikes() {
        for c in [b'I', b'O', b'0', b'1'] {
            assert!(!CODE_ALPHABET.contains(&c));
        }
    }

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let code = ConfirmationCode::parse("  abcd2345 ");
        assert_eq!(code.as_str(), "ABCD2345");
        assert!(code.is_well_formed());
    }

    #[test]
    fn malformed_input_is_detected() {
        assert!(!ConfirmationCode::parse("short").is_well_formed());
        assert!(!ConfirmationCode::parse("ABCDEFG0").is_well_formed());
    }
}
