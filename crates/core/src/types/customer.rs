//! Customer references recorded on orders.
//!
//! An order is tagged with whoever placed it: the email from the bearer token
//! when there is one, the token subject otherwise, and `guest` for anonymous
//! checkouts.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Stored reference for anonymous checkouts.
pub const GUEST: &str = "guest";

/// Maximum stored length, matching the `orders.user_ref` column.
pub const MAX_LEN: usize = 255;

/// Errors that can occur when parsing a stored [`CustomerRef`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CustomerRefError {
    /// The reference is empty after trimming.
    #[error("customer reference cannot be empty")]
    Empty,
    /// The reference is longer than the column allows.
    #[error("customer reference exceeds {MAX_LEN} characters")]
    TooLong,
}

/// Who an order belongs to.
///
/// ```
/// use hostdeck_core::CustomerRef;
///
/// let r = CustomerRef::from_identity(Some("Ada@Example.com"), Some("abc"));
/// assert_eq!(r.as_str(), "ada@example.com");
/// assert_eq!(CustomerRef::from_identity(None, None).as_str(), "guest");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CustomerRef {
    /// Lower-cased email address.
    Email(String),
    /// Token subject claim.
    Subject(String),
    /// No identity was presented.
    Guest,
}

impl CustomerRef {
    /// Choose a reference from the identity claims, preferring the email.
    ///
    /// Blank values are treated as missing.
    #[must_use]
    pub fn from_identity(email: Option<&str>, subject: Option<&str>) -> Self {
        let email = email.map(str::trim).filter(|e| !e.is_empty());
        let subject = subject.map(str::trim).filter(|s| !s.is_empty());

        match (email, subject) {
            (Some(email), _) => Self::Email(email.to_lowercase()),
            (None, Some(subject)) => Self::Subject(subject.to_owned()),
            (None, None) => Self::Guest,
        }
    }

    /// Parse a reference as stored on an order row.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is blank or longer than [`MAX_LEN`].
    pub fn parse(s: &str) -> Result<Self, CustomerRefError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CustomerRefError::Empty);
        }
        if trimmed.chars().count() > MAX_LEN {
            return Err(CustomerRefError::TooLong);
        }
        if trimmed == GUEST {
            return Ok(Self::Guest);
        }
        if trimmed.contains('@') {
            return Ok(Self::Email(trimmed.to_lowercase()));
        }
        Ok(Self::Subject(trimmed.to_owned()))
    }

    /// The value written to the database.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Email(v) | Self::Subject(v) => v,
            Self::Guest => GUEST,
        }
    }

    /// Whether this is the anonymous reference.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }
}

impl fmt::Display for CustomerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for CustomerRef {
    type Error = CustomerRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CustomerRef> for String {
    fn from(r: CustomerRef) -> Self {
        match r {
            CustomerRef::Email(v) | CustomerRef::Subject(v) => v,
            CustomerRef::Guest => GUEST.to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_email_wins_over_subject() {
        let r = CustomerRef::from_identity(Some("  Bob@Example.COM "), Some("sub-1"));
        assert_eq!(r, CustomerRef::Email("bob@example.com".to_owned()));
    }

    #[test]
    fn test_subject_fallback() {
        let r = CustomerRef::from_identity(Some("   "), Some("sub-1"));
        assert_eq!(r, CustomerRef::Subject("sub-1".to_owned()));
    }

    #[test]
    fn test_guest_fallback() {
        let r = CustomerRef::from_identity(None, Some(""));
        assert!(r.is_guest());
        assert_eq!(r.to_string(), "guest");
    }

    #[test]
    fn test_parse_stored_values() {
        assert_eq!(CustomerRef::parse("guest").unwrap(), CustomerRef::Guest);
        assert_eq!(
            CustomerRef::parse("a@b.co").unwrap(),
            CustomerRef::Email("a@b.co".to_owned())
        );
        assert_eq!(
            CustomerRef::parse("google-oauth2|123").unwrap(),
            CustomerRef::Subject("google-oauth2|123".to_owned())
        );
        assert_eq!(CustomerRef::parse(" "), Err(CustomerRefError::Empty));
        assert_eq!(
            CustomerRef::parse(&"x".repeat(MAX_LEN + 1)),
            Err(CustomerRefError::TooLong)
        );
    }
}
