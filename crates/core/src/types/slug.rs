//! URL slugs for site-builder pages.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Maximum slug length.
pub const MAX_SLUG_LEN: usize = 120;

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,
    #[error("slug exceeds {MAX_SLUG_LEN} characters")]
    TooLong,
    #[error("slug may only contain letters, digits, '-' and '_'")]
    InvalidCharacter,
}

/// A page slug: 1–120 characters of `[A-Za-z0-9_-]`.
///
/// ```
/// use hostdeck_core::Slug;
///
/// assert!(Slug::parse("about-us").is_ok());
/// assert!(Slug::parse("about us").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validate a slug. Case is preserved.
    ///
    /// # Errors
    ///
    /// Returns a [`SlugError`] describing the first rule that failed.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > MAX_SLUG_LEN {
            return Err(SlugError::TooLong);
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(SlugError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}
