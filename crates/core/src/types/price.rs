//! Currency codes.
//!
//! Checkout amounts are integer minor units (cents) tagged with a
//! [`CurrencyCode`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CurrencyCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// The code is not three ASCII letters.
    #[error("currency must be a three-letter ISO 4217 code, got {0:?}")]
    Invalid(String),
}

/// A lower-cased ISO 4217 currency code (`usd`, `eur`, ...).
///
/// Stored lower-case because that is what the payment provider expects.
///
/// ```
/// use hostdeck_core::CurrencyCode;
///
/// assert_eq!(CurrencyCode::parse("USD").unwrap().as_str(), "usd");
/// assert!(CurrencyCode::parse("dollars").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a currency code, normalizing to lower case.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::Invalid`] unless the input is exactly three
    /// ASCII letters (surrounding whitespace is ignored).
    pub fn parse(s: &str) -> Result<Self, CurrencyError> {
        let trimmed = s.trim();
        if trimmed.len() != 3 || !trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(CurrencyError::Invalid(s.to_owned()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self("usd".to_owned())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code_normalizes_case() {
        assert_eq!(CurrencyCode::parse(" EUR ").unwrap().as_str(), "eur");
    }

    #[test]
    fn test_currency_code_rejects_garbage() {
        assert!(CurrencyCode::parse("").is_err());
        assert!(CurrencyCode::parse("us").is_err());
        assert!(CurrencyCode::parse("us1").is_err());
        assert!(CurrencyCode::parse("usdd").is_err());
    }
}
