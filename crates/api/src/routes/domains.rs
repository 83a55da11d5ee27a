//! Domain availability and suggestion routes.
//!
//! Thin wrappers over the registrar client. Every route here is rate limited
//! per client IP because each request costs a registrar call.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tracing::instrument;

use hostdeck_core::{DomainName, TldList};

use crate::error::Result;
use crate::middleware::domain_rate_limiter;
use crate::registrar::{KeywordSuggestion, SpinSuggestion};
use crate::routes::extract::QueryParams;
use crate::services::domains::{CheckQuery, KeywordQuery, SpinQuery};
use crate::state::AppState;

/// Create the domain routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check", get(check))
        .route("/suggest", get(suggest))
        .route("/suggest2", get(suggest_keywords))
        .layer(domain_rate_limiter())
}

/// Response of `GET /domain/check`.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub domain: DomainName,
    pub available: bool,
    pub code: String,
    pub text: String,
}

/// Response of `GET /domain/suggest`.
#[derive(Debug, Serialize)]
pub struct SpinResponse {
    pub query: DomainName,
    /// Comma-joined, e.g. `"com,net"`.
    pub tlds: TldList,
    pub suggestions: Vec<SpinSuggestion>,
}

/// Response of `GET /domain/suggest2`.
#[derive(Debug, Serialize)]
pub struct KeywordResponse {
    pub query: String,
    pub tlds: TldList,
    pub count: usize,
    pub suggestions: Vec<KeywordSuggestion>,
}

/// Check whether one domain can be registered.
///
/// GET /domain/check?q=example.com
#[instrument(skip(state))]
pub async fn check(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<CheckQuery>,
) -> Result<Json<CheckResponse>> {
    let domain = query.domain()?;
    let result = state.registrar().check(&domain).await?;

    Ok(Json(CheckResponse {
        domain,
        available: result.available,
        code: result.code,
        text: result.text,
    }))
}

/// Spinner suggestions, best score first.
///
/// GET /domain/suggest?q=example.com&tlds=com,net
#[instrument(skip(state))]
pub async fn suggest(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SpinQuery>,
) -> Result<Json<SpinResponse>> {
    let (domain, options) = query.into_lookup()?;
    let suggestions = state.registrar().spin(&domain, &options).await?;

    Ok(Json(SpinResponse {
        query: domain,
        tlds: options.tlds,
        suggestions,
    }))
}

/// Keyword suggestions in registrar order.
///
/// GET /domain/suggest2?q=coffee&tlds=com,io
#[instrument(skip(state))]
pub async fn suggest_keywords(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<KeywordQuery>,
) -> Result<Json<KeywordResponse>> {
    let lookup = query.into_lookup()?;
    let suggestions = state
        .registrar()
        .keyword_suggestions(&lookup.term, &lookup.options)
        .await?;

    Ok(Json(KeywordResponse {
        query: lookup.query,
        tlds: lookup.options.tlds,
        count: suggestions.len(),
        suggestions,
    }))
}
