//! Query-string parsing for the `/domain/*` lookups.
//!
//! Parameters arrive as loose strings. Each lookup turns them into a
//! validated request with the documented defaults, or a 400 message.

use serde::Deserialize;

use hostdeck_core::{DomainName, TldList, search_term};

use crate::error::AppError;
use crate::registrar::{KeywordOptions, Relevance, SpinOptions};

/// Extensions used by the spinner when `tlds` is absent.
pub const DEFAULT_SPIN_TLDS: &str = "com,net,tv,cc";

/// Extensions used by keyword suggestions when `tlds` is absent.
pub const DEFAULT_KEYWORD_TLDS: &str = "com,net,org,io,co,xyz";

/// Upper bound accepted for `max`.
pub const MAX_RESULTS_LIMIT: u32 = 100;

/// Highest registrar spin type.
pub const MAX_SPIN_TYPE: u8 = 4;

const MISSING_CHECK_QUERY: &str = "Missing ?q (e.g. ?q=example.com)";
const MISSING_QUERY: &str = "Missing ?q";

/// `GET /domain/check` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CheckQuery {
    pub q: Option<String>,
}

/// `GET /domain/suggest` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SpinQuery {
    pub q: Option<String>,
    pub tlds: Option<String>,
    pub max: Option<String>,
    pub hyphens: Option<String>,
    pub numbers: Option<String>,
    pub basic: Option<String>,
    pub related: Option<String>,
    pub similar: Option<String>,
    pub topical: Option<String>,
}

/// `GET /domain/suggest2` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct KeywordQuery {
    pub q: Option<String>,
    pub tlds: Option<String>,
    pub max: Option<String>,
    #[serde(rename = "spinType")]
    pub spin_type: Option<String>,
    pub premium: Option<String>,
    pub allga: Option<String>,
    pub adult: Option<String>,
}

/// A validated keyword lookup.
#[derive(Debug, Clone)]
pub struct KeywordLookup {
    /// The trimmed, lower-cased `q` as sent.
    pub query: String,
    /// The part of `query` before the first dot.
    pub term: String,
    pub options: KeywordOptions,
}

impl CheckQuery {
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if `q` is missing or not a domain.
    pub fn domain(&self) -> Result<DomainName, AppError> {
        required_domain(self.q.as_deref(), MISSING_CHECK_QUERY)
    }
}

impl SpinQuery {
    /// Validate the seed domain and spinner options.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` naming the first invalid parameter.
    pub fn into_lookup(self) -> Result<(DomainName, SpinOptions), AppError> {
        let domain = required_domain(self.q.as_deref(), MISSING_QUERY)?;

        let options = SpinOptions {
            tlds: tld_list(self.tlds.as_deref(), DEFAULT_SPIN_TLDS)?,
            max_results: max_results(self.max.as_deref(), 20)?,
            use_hyphens: flag("hyphens", self.hyphens.as_deref(), false)?,
            use_numbers: flag("numbers", self.numbers.as_deref(), true)?,
            basic: relevance("basic", self.basic.as_deref(), Relevance::Medium)?,
            related: relevance("related", self.related.as_deref(), Relevance::High)?,
            similar: relevance("similar", self.similar.as_deref(), Relevance::Medium)?,
            topical: relevance("topical", self.topical.as_deref(), Relevance::Medium)?,
        };

        Ok((domain, options))
    }
}

impl KeywordQuery {
    /// Validate the search term and keyword options.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` naming the first invalid parameter.
    pub fn into_lookup(self) -> Result<KeywordLookup, AppError> {
        let query = self
            .q
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::BadRequest(MISSING_QUERY.to_owned()))?;
        let term = search_term(&query).ok_or_else(|| AppError::BadRequest(MISSING_QUERY.to_owned()))?;

        let spin_type = match non_blank(self.spin_type.as_deref()) {
            None => 0,
            Some(raw) => raw
                .parse::<u8>()
                .ok()
                .filter(|t| *t <= MAX_SPIN_TYPE)
                .ok_or_else(|| {
                    AppError::BadRequest(format!("spinType must be between 0 and {MAX_SPIN_TYPE}"))
                })?,
        };

        let options = KeywordOptions {
            tlds: tld_list(self.tlds.as_deref(), DEFAULT_KEYWORD_TLDS)?,
            max_results: max_results(self.max.as_deref(), 40)?,
            spin_type,
            premium: flag("premium", self.premium.as_deref(), false)?,
            all_ga: flag("allga", self.allga.as_deref(), true)?,
            adult: flag("adult", self.adult.as_deref(), false)?,
        };

        Ok(KeywordLookup {
            query,
            term,
            options,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required_domain(q: Option<&str>, missing: &str) -> Result<DomainName, AppError> {
    let q = non_blank(q).ok_or_else(|| AppError::BadRequest(missing.to_owned()))?;
    Ok(DomainName::parse(q)?)
}

fn tld_list(value: Option<&str>, default: &str) -> Result<TldList, AppError> {
    let list = TldList::parse_or(non_blank(value), default)
        .map_err(|e| AppError::BadRequest(format!("tlds: {e}")))?;
    if list.is_empty() {
        return Err(AppError::BadRequest("tlds: at least one extension is required".to_owned()));
    }
    Ok(list)
}

fn max_results(value: Option<&str>, default: u32) -> Result<u32, AppError> {
    match non_blank(value) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|n| (1..=MAX_RESULTS_LIMIT).contains(n))
            .ok_or_else(|| {
                AppError::BadRequest(format!("max must be between 1 and {MAX_RESULTS_LIMIT}"))
            }),
    }
}

fn flag(name: &str, value: Option<&str>, default: bool) -> Result<bool, AppError> {
    match non_blank(value).map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(_) => Err(AppError::BadRequest(format!("{name} must be true or false"))),
    }
}

fn relevance(name: &str, value: Option<&str>, default: Relevance) -> Result<Relevance, AppError> {
    non_blank(value).map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|e| AppError::BadRequest(format!("{name}: {e}")))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn bad_request(err: AppError) -> String {
        match err {
            AppError::BadRequest(msg) => msg,
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn test_check_query_normalizes_domain() {
        let query = CheckQuery {
            q: Some("  Example.COM ".to_owned()),
        };
        assert_eq!(query.domain().unwrap().to_string(), "example.com");
    }

    #[test]
    fn test_check_query_messages() {
        let missing = CheckQuery { q: Some("   ".to_owned()) };
        assert_eq!(bad_request(missing.domain().unwrap_err()), MISSING_CHECK_QUERY);

        let invalid = CheckQuery {
            q: Some("no_dots".to_owned()),
        };
        assert_eq!(bad_request(invalid.domain().unwrap_err()), "Invalid domain format");
    }

    #[test]
    fn test_spin_defaults() {
        let (domain, options) = SpinQuery {
            q: Some("brew.com".to_owned()),
            ..SpinQuery::default()
        }
        .into_lookup()
        .unwrap();

        assert_eq!(domain.label(), "brew");
        assert_eq!(options.tlds.to_csv(), "com,net,tv,cc");
        assert_eq!(options.max_results, 20);
        assert!(!options.use_hyphens);
        assert!(options.use_numbers);
        assert_eq!(options.basic, Relevance::Medium);
        assert_eq!(options.related, Relevance::High);
    }

    #[test]
    fn test_spin_rejects_bad_parameters() {
        let with = |f: fn(&mut SpinQuery)| {
            let mut q = SpinQuery {
                q: Some("brew.com".to_owned()),
                ..SpinQuery::default()
            };
            f(&mut q);
            bad_request(q.into_lookup().unwrap_err())
        };

        assert!(with(|q| q.max = Some("0".to_owned())).starts_with("max"));
        assert!(with(|q| q.max = Some("abc".to_owned())).starts_with("max"));
        assert!(with(|q| q.hyphens = Some("maybe".to_owned())).starts_with("hyphens"));
        assert!(with(|q| q.basic = Some("Extreme".to_owned())).starts_with("basic"));
        assert!(with(|q| q.tlds = Some("com,n t".to_owned())).starts_with("tlds"));
    }

    #[test]
    fn test_keyword_term_and_defaults() {
        let lookup = KeywordQuery {
            q: Some("Coffee.Shop".to_owned()),
            ..KeywordQuery::default()
        }
        .into_lookup()
        .unwrap();

        assert_eq!(lookup.query, "coffee.shop");
        assert_eq!(lookup.term, "coffee");
        assert_eq!(lookup.options.tlds.to_csv(), "com,net,org,io,co,xyz");
        assert_eq!(lookup.options.max_results, 40);
        assert!(lookup.options.all_ga);
        assert!(!lookup.options.premium);
    }

    #[test]
    fn test_keyword_spin_type_range() {
        let lookup = KeywordQuery {
            q: Some("coffee".to_owned()),
            spin_type: Some("4".to_owned()),
            ..KeywordQuery::default()
        }
        .into_lookup()
        .unwrap();
        assert_eq!(lookup.options.spin_type, 4);

        let err = KeywordQuery {
            q: Some("coffee".to_owned()),
            spin_type: Some("5".to_owned()),
            ..KeywordQuery::default()
        }
        .into_lookup()
        .unwrap_err();
        assert!(bad_request(err).starts_with("spinType"));
    }

    #[test]
    fn test_keyword_requires_term() {
        let err = KeywordQuery {
            q: Some(".com".to_owned()),
            ..KeywordQuery::default()
        }
        .into_lookup()
        .unwrap_err();
        assert_eq!(bad_request(err), MISSING_QUERY);
    }
}
