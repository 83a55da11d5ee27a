//! Domain names and extension lists used by the registrar lookups.
//!
//! A [`DomainName`] is a second-level label plus an extension
//! (`example` + `co.uk`). Parsing trims and lower-cases the input, so
//! `" Example.COM "` and `"example.com"` are the same domain.

use core::fmt;

use serde::{Serialize, Serializer};

/// Maximum length of the second-level label.
pub const MAX_LABEL_LEN: usize = 63;

/// Minimum length of the extension.
pub const MIN_EXTENSION_LEN: usize = 2;

/// Maximum length of the extension.
pub const MAX_EXTENSION_LEN: usize = 63;

/// Errors that can occur when validating domain input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Nothing was supplied.
    #[error("domain cannot be empty")]
    Empty,
    /// Input did not have the `label.extension` shape or used bad characters.
    #[error("invalid domain format")]
    InvalidFormat,
    /// An extension in a comma-separated list used bad characters.
    #[error("invalid extension {0:?}")]
    InvalidExtension(String),
}

/// A validated `label.extension` domain name.
///
/// ```
/// use hostdeck_core::DomainName;
///
/// let d = DomainName::parse(" Example.CO.uk ").unwrap();
/// assert_eq!(d.label(), "example");
/// assert_eq!(d.extension(), "co.uk");
/// assert_eq!(d.to_string(), "example.co.uk");
///
/// assert!(DomainName::parse("example").is_err());
/// assert!(DomainName::parse(".com").is_err());
/// assert!(DomainName::parse("ex_ample.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainName {
    label: String,
    extension: String,
}

const fn is_label_byte(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'
}

const fn is_extension_byte(b: u8) -> bool {
    is_label_byte(b) || b == b'.'
}

impl DomainName {
    /// Parse and normalize a domain name.
    ///
    /// The label is everything before the first `.`: 1–63 characters of
    /// `[a-z0-9-]`. The extension is the rest: 2–63 characters of
    /// `[a-z0-9.-]`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Empty`] for blank input and
    /// [`DomainError::InvalidFormat`] for anything else that does not match.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let normalized = input.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::Empty);
        }

        let (label, extension) = normalized
            .split_once('.')
            .ok_or(DomainError::InvalidFormat)?;

        if label.is_empty()
            || label.len() > MAX_LABEL_LEN
            || !label.bytes().all(is_label_byte)
        {
            return Err(DomainError::InvalidFormat);
        }

        if extension.len() < MIN_EXTENSION_LEN
            || extension.len() > MAX_EXTENSION_LEN
            || !extension.bytes().all(is_extension_byte)
        {
            return Err(DomainError::InvalidFormat);
        }

        Ok(Self {
            label: label.to_owned(),
            extension: extension.to_owned(),
        })
    }

    /// The second-level label (`example` in `example.com`).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The extension (`com` in `example.com`).
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.label, self.extension)
    }
}

impl Serialize for DomainName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Take the keyword part of a free-form search query.
///
/// Everything from the first `.` on is dropped, so both `"coffee"` and
/// `"Coffee.shop"` search for `coffee`. Returns `None` when nothing is left.
#[must_use]
pub fn search_term(query: &str) -> Option<String> {
    let normalized = query.trim().to_lowercase();
    let term = normalized.split('.').next().unwrap_or_default().trim();
    if term.is_empty() {
        None
    } else {
        Some(term.to_owned())
    }
}

/// An ordered, de-duplicated list of domain extensions.
///
/// Parsed from comma-separated input such as `"com, NET,.io,,com"`, which
/// yields `["com", "net", "io"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TldList(Vec<String>);

impl TldList {
    /// Parse a comma-separated list of extensions.
    ///
    /// Entries are trimmed, lower-cased and stripped of leading dots. Blank
    /// entries and repeats are dropped; first occurrence wins.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidExtension`] if an entry contains
    /// anything other than `[a-z0-9.-]`.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let mut out: Vec<String> = Vec::new();
        for raw in input.split(',') {
            let entry = raw.trim().to_ascii_lowercase();
            let entry = entry.trim_start_matches('.');
            if entry.is_empty() {
                continue;
            }
            if entry.len() > MAX_EXTENSION_LEN || !entry.bytes().all(is_extension_byte) {
                return Err(DomainError::InvalidExtension(raw.trim().to_owned()));
            }
            if !out.iter().any(|e| e == entry) {
                out.push(entry.to_owned());
            }
        }
        Ok(Self(out))
    }

    /// Parse `input` when present and non-blank, otherwise `default`.
    ///
    /// # Errors
    ///
    /// Same as [`TldList::parse`].
    pub fn parse_or(input: Option<&str>, default: &str) -> Result<Self, DomainError> {
        match input.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => Self::parse(s),
            None => Self::parse(default),
        }
    }

    /// Number of extensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the extensions in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Comma-joined form, as sent to the registrar.
    #[must_use]
    pub fn to_csv(&self) -> String {
        self.0.join(",")
    }
}

impl fmt::Display for TldList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_csv())
    }
}

impl Serialize for TldList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_domains() {
        for input in [
            "example.com",
            "EXAMPLE.COM",
            "a.io",
            "my-site.co.uk",
            "123.xyz",
            "x-.tv",
            "example.xn--p1ai",
        ] {
            assert!(DomainName::parse(input).is_ok(), "should accept {input}");
        }
    }

    #[test]
    fn test_rejects_invalid_domains() {
        for input in [
            "",
            "   ",
            "example",
            ".com",
            "example.",
            "example.c",
            "exa mple.com",
            "ex_ample.com",
            "example.c_m",
            "exämple.com",
            "http://example.com",
        ] {
            assert!(DomainName::parse(input).is_err(), "should reject {input:?}");
        }
    }

    #[test]
    fn test_length_limits() {
        let label = "a".repeat(MAX_LABEL_LEN);
        assert!(DomainName::parse(&format!("{label}.com")).is_ok());
        assert!(DomainName::parse(&format!("{label}a.com")).is_err());

        let ext = "c".repeat(MAX_EXTENSION_LEN);
        assert!(DomainName::parse(&format!("a.{ext}")).is_ok());
        assert!(DomainName::parse(&format!("a.{ext}c")).is_err());
    }

    #[test]
    fn test_normalizes_case_and_whitespace() {
        let d = DomainName::parse("  Example.COM\n").unwrap();
        assert_eq!(d.to_string(), "example.com");
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"example.com\"");
    }

    #[test]
    fn test_search_term() {
        assert_eq!(search_term("Coffee.Shop").as_deref(), Some("coffee"));
        assert_eq!(search_term("  coffee ").as_deref(), Some("coffee"));
        assert_eq!(search_term(".com"), None);
        assert_eq!(search_term(""), None);
    }

    #[test]
    fn test_tld_list_parse() {
        let list = TldList::parse(" com, NET,.io,,com ").unwrap();
        assert_eq!(list.iter().collect::<Vec<_>>(), ["com", "net", "io"]);
        assert_eq!(list.to_csv(), "com,net,io");
    }

    #[test]
    fn test_tld_list_rejects_bad_entries() {
        assert_eq!(
            TldList::parse("com,n&t"),
            Err(DomainError::InvalidExtension("n&t".to_owned()))
        );
    }

    #[test]
    fn test_tld_list_default() {
        let list = TldList::parse_or(Some("  "), "com,net").unwrap();
        assert_eq!(list.to_csv(), "com,net");
        let list = TldList::parse_or(None, "com,net").unwrap();
        assert_eq!(list.len(), 2);
        let list = TldList::parse_or(Some("tv"), "com,net").unwrap();
        assert_eq!(list.to_csv(), "tv");
    }
}
