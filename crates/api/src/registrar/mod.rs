//! Domain registrar (eNom reseller API) client.
//!
//! All commands are `GET {base}/interface.asp` with the reseller credentials
//! and a `responsetype` in the query string. `check` and `NameSpinner` answer
//! in XML; `GetNameSuggestions` is requested as `key=value` text.

pub mod parse;
pub mod types;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use hostdeck_core::DomainName;

use crate::config::RegistrarConfig;

pub use types::{
    AvailabilityCheck, KeywordOptions, KeywordSuggestion, Relevance, SpinOptions, SpinSuggestion,
};

/// Errors that can occur when talking to the registrar.
#[derive(Debug, Error)]
pub enum RegistrarError {
    /// Transport failure or timeout. The URL is stripped because it carries
    /// the reseller credentials.
    #[error("Upstream error contacting registrar: {0}")]
    Http(reqwest::Error),

    /// Non-success HTTP status.
    #[error("Upstream error contacting registrar: HTTP {status}")]
    Status { status: u16 },

    /// The registrar answered but reported a failure.
    #[error("{0}")]
    Upstream(String),

    /// The response body could not be decoded.
    #[error("Failed to parse registrar response: {0}")]
    Parse(String),

    /// The client could not be configured.
    #[error("Invalid registrar configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RegistrarError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

#[derive(Debug, Clone, Copy)]
enum ResponseType {
    Xml,
    Text,
}

impl ResponseType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Text => "text",
        }
    }
}

/// Registrar API client.
#[derive(Clone)]
pub struct RegistrarClient {
    client: reqwest::Client,
    endpoint: Url,
    uid: String,
    token: SecretString,
}

impl RegistrarClient {
    /// Create a new registrar client.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client fails to build.
    pub fn new(config: &RegistrarConfig) -> Result<Self, RegistrarError> {
        let endpoint = format!("{}/interface.asp", config.base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| RegistrarError::Config(format!("ENOM_BASE_URL: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            uid: config.uid.clone(),
            token: config.token.clone(),
        })
    }

    /// Send one command and return the raw body.
    async fn get(
        &self,
        params: &[(&str, String)],
        response_type: ResponseType,
    ) -> Result<String, RegistrarError> {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query
                .append_pair("uid", &self.uid)
                .append_pair("pw", self.token.expose_secret())
                .append_pair("responsetype", response_type.as_str());
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                body = %body_excerpt(&body),
                "Registrar returned error status"
            );
            return Err(RegistrarError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    /// Check whether a single domain can be registered.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-success status, malformed
    /// XML, or a registrar-reported failure.
    #[instrument(skip(self), fields(domain = %domain))]
    pub async fn check(&self, domain: &DomainName) -> Result<AvailabilityCheck, RegistrarError> {
        let body = self
            .get(
                &[
                    ("command", "check".to_owned()),
                    ("SLD", domain.label().to_owned()),
                    ("TLD", domain.extension().to_owned()),
                    ("Version", "1".to_owned()),
                ],
                ResponseType::Xml,
            )
            .await?;

        parse::parse_check(&body)
    }

    /// Ask the spinner for variations of `domain` across the requested extensions.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-success status, malformed
    /// XML, or a registrar-reported failure.
    #[instrument(skip(self, options), fields(domain = %domain, tlds = %options.tlds))]
    pub async fn spin(
        &self,
        domain: &DomainName,
        options: &SpinOptions,
    ) -> Result<Vec<SpinSuggestion>, RegistrarError> {
        let body = self
            .get(
                &[
                    ("command", "NameSpinner".to_owned()),
                    ("SLD", domain.label().to_owned()),
                    ("TLD", domain.extension().to_owned()),
                    ("TLDList", options.tlds.to_csv()),
                    ("MaxResults", options.max_results.to_string()),
                    ("UseHyphens", capitalized_bool(options.use_hyphens).to_owned()),
                    ("UseNumbers", capitalized_bool(options.use_numbers).to_owned()),
                    ("Basic", options.basic.to_string()),
                    ("Related", options.related.to_string()),
                    ("Similar", options.similar.to_string()),
                    ("Topical", options.topical.to_string()),
                ],
                ResponseType::Xml,
            )
            .await?;

        let suggestions = parse::parse_spin(&body, &options.tlds)?;
        tracing::debug!(count = suggestions.len(), "Spinner suggestions decoded");
        Ok(suggestions)
    }

    /// Ask for keyword-based suggestions for `term`.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-success status, or a
    /// registrar-reported failure.
    #[instrument(skip(self, options), fields(term = %term, tlds = %options.tlds))]
    pub async fn keyword_suggestions(
        &self,
        term: &str,
        options: &KeywordOptions,
    ) -> Result<Vec<KeywordSuggestion>, RegistrarError> {
        let body = self
            .get(
                &[
                    ("command", "GetNameSuggestions".to_owned()),
                    ("SearchTerm", term.to_owned()),
                    ("TldList", options.tlds.to_csv()),
                    ("MaxResult", options.max_results.to_string()),
                    ("SpinType", options.spin_type.to_string()),
                    ("Premium", options.premium.to_string()),
                    ("AllGA", options.all_ga.to_string()),
                    ("Adult", options.adult.to_string()),
                ],
                ResponseType::Text,
            )
            .await?;

        let suggestions = parse::parse_keyword(&body)?;
        tracing::debug!(count = suggestions.len(), "Keyword suggestions decoded");
        Ok(suggestions)
    }
}

const fn capitalized_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Maximum number of characters of an error body kept for logging.
const BODY_EXCERPT_CHARS: usize = 200;

/// First [`BODY_EXCERPT_CHARS`] characters of `body`, trimmed.
fn body_excerpt(body: &str) -> &str {
    let body = body.trim();
    match body.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((end, _)) => body.get(..end).unwrap_or(body),
        None => body,
    }
}
