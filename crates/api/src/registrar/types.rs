//! Request options and normalized results for registrar lookups.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use hostdeck_core::TldList;

/// Response code the registrar uses for "this domain can be registered".
pub const RRP_AVAILABLE: &str = "210";

/// Result of an availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityCheck {
    pub available: bool,
    /// Registrar response code, passed through unchanged.
    pub code: String,
    /// Registrar response text, passed through unchanged.
    pub text: String,
}

impl AvailabilityCheck {
    /// Build from the raw registrar code and text.
    #[must_use]
    pub fn from_code(code: String, text: String) -> Self {
        Self {
            available: code == RRP_AVAILABLE,
            code,
            text,
        }
    }
}

/// One (label, extension) suggestion from the spinner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpinSuggestion {
    pub sld: String,
    pub tld: String,
    pub domain: String,
    pub available: bool,
    pub score: i64,
}

/// One keyword suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordSuggestion {
    pub sld: String,
    pub tld: String,
    pub domain: String,
    pub score: f64,
}

/// Spinner relevance weighting for one suggestion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    Off,
    Low,
    Medium,
    High,
}

impl Relevance {
    /// The value the registrar expects.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Relevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unrecognized relevance value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("relevance must be one of Off, Low, Medium, High (got {0:?})")]
pub struct InvalidRelevance(pub String);

impl FromStr for Relevance {
    type Err = InvalidRelevance;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(InvalidRelevance(s.to_owned())),
        }
    }
}

/// Options for a spinner (`NameSpinner`) lookup.
#[derive(Debug, Clone)]
pub struct SpinOptions {
    pub tlds: TldList,
    pub max_results: u32,
    pub use_hyphens: bool,
    pub use_numbers: bool,
    pub basic: Relevance,
    pub related: Relevance,
    pub similar: Relevance,
    pub topical: Relevance,
}

/// Options for a keyword (`GetNameSuggestions`) lookup.
#[derive(Debug, Clone)]
pub struct KeywordOptions {
    pub tlds: TldList,
    pub max_results: u32,
    pub spin_type: u8,
    pub premium: bool,
    pub all_ga: bool,
    pub adult: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_only_210_is_available() {
        let check = AvailabilityCheck::from_code("210".into(), "Domain available".into());
        assert!(check.available);
        assert_eq!(check.code, "210");

        for code in ["211", "", "2100", "540"] {
            let check = AvailabilityCheck::from_code(code.into(), "Domain not available".into());
            assert!(!check.available, "{code} should not be available");
            assert_eq!(check.code, code);
            assert_eq!(check.text, "Domain not available");
        }
    }

    #[test]
    fn test_relevance_parse_is_case_insensitive() {
        assert_eq!("HIGH".parse::<Relevance>().unwrap(), Relevance::High);
        assert_eq!(" medium ".parse::<Relevance>().unwrap(), Relevance::Medium);
        assert_eq!(Relevance::Off.to_string(), "Off");
        assert!("extreme".parse::<Relevance>().is_err());
    }
}
