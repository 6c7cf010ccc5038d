//! IMEI parsing and check-digit validation
//!
//! An IMEI is a 15-digit decimal string: an 8-digit type allocation code
//! (TAC), a 6-digit serial segment, and a Luhn check digit. `Imei::parse`
//! is the only way to construct an [`Imei`], so every instance in the
//! system is already length-, charset-, and checksum-valid.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mask;

/// Total IMEI length in digits
pub const IMEI_LENGTH: usize = 15;

/// Length of the type allocation code prefix
pub const TAC_LENGTH: usize = 8;

/// Length of the relaxed prefix used for fallback registry matching
pub const SHORT_PREFIX_LENGTH: usize = 6;

/// Placeholder sequences that are rejected even when their check digit
/// happens to be correct. These show up constantly as throwaway test
/// input and never identify a real device.
const PLACEHOLDER_IDS: &[&str] = &["123456789012345", "012345678901234"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImeiError {
    #[error("invalid length: expected {IMEI_LENGTH} digits, got {0}")]
    WrongLength(usize),
    #[error("invalid character {0:?}: IMEI must be decimal digits only")]
    NonDigit(char),
    #[error("check digit mismatch: expected {expected}, got {actual}")]
    CheckDigit { expected: u8, actual: u8 },
    #[error("degenerate pattern: all 15 digits identical")]
    RepeatedDigits,
    #[error("degenerate pattern: well-known placeholder sequence")]
    Placeholder,
}

/// A validated 15-digit device identifier
///
/// `Display` prints the masked form (middle digits redacted), so an IMEI
/// interpolated into a log line or error message never exposes the full
/// identifier. Use [`Imei::as_str`] where the complete value is needed,
/// e.g. when building a provider request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Imei(String);

impl Imei {
    /// Parse and validate a raw identifier string
    pub fn parse(raw: &str) -> Result<Self, ImeiError> {
        if raw.len() != IMEI_LENGTH {
            return Err(ImeiError::WrongLength(raw.len()));
        }
        if let Some(c) = raw.chars().find(|c| !c.is_ascii_digit()) {
            return Err(ImeiError::NonDigit(c));
        }

        let digits = digit_values(raw);
        if digits.iter().all(|&d| d == digits[0]) {
            return Err(ImeiError::RepeatedDigits);
        }
        if PLACEHOLDER_IDS.contains(&raw) {
            return Err(ImeiError::Placeholder);
        }

        let expected = luhn_check_digit(&digits[..IMEI_LENGTH - 1]);
        let actual = digits[IMEI_LENGTH - 1];
        if expected != actual {
            return Err(ImeiError::CheckDigit { expected, actual });
        }

        Ok(Self(raw.to_string()))
    }

    /// The full 15-digit identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 8-digit type allocation code
    pub fn tac(&self) -> &str {
        &self.0[..TAC_LENGTH]
    }

    /// The 6-digit prefix used for relaxed registry matching
    pub fn short_prefix(&self) -> &str {
        &self.0[..SHORT_PREFIX_LENGTH]
    }

    /// The 6-digit serial segment between TAC and check digit
    pub fn serial(&self) -> &str {
        &self.0[TAC_LENGTH..IMEI_LENGTH - 1]
    }

    /// The check digit (15th digit)
    pub fn check_digit(&self) -> u8 {
        self.0.as_bytes()[IMEI_LENGTH - 1] - b'0'
    }

    /// The masked form, safe for logs and diagnostics
    pub fn masked(&self) -> String {
        mask::mask(&self.0)
    }
}

impl std::fmt::Display for Imei {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl TryFrom<String> for Imei {
    type Error = ImeiError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<Imei> for String {
    fn from(imei: Imei) -> Self {
        imei.0
    }
}

/// Compute the Luhn check digit over a run of digits
///
/// Per the IMEI scheme: double every second digit starting from the
/// rightmost of the input, subtract 9 from any doubled value over 9, sum
/// everything, and take `(10 - sum % 10) % 10`.
pub fn luhn_check_digit(digits: &[u8]) -> u8 {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 0 {
                let doubled = d * 2;
                u32::from(if doubled > 9 { doubled - 9 } else { doubled })
            } else {
                u32::from(d)
            }
        })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

/// Append the correct check digit to a 14-digit body
///
/// Handy for tooling and tests that need a checksum-valid identifier from
/// an arbitrary TAC + serial.
pub fn with_check_digit(body: &str) -> String {
    let digits = digit_values(body);
    format!("{}{}", body, luhn_check_digit(&digits))
}

fn digit_values(s: &str) -> Vec<u8> {
    s.bytes().map(|b| b - b'0').collect()
}
