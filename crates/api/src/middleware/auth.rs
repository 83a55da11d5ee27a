//! Bearer-token authentication extractor.
//!
//! Handlers that need a caller take [`RequireAccount`]. The token is verified
//! with the shared secret and the local account is created on first sight.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::db::AccountRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::Account;
use crate::services::TokenError;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAccount(account): RequireAccount,
/// ) -> impl IntoResponse {
///     format!("Hello, account {}!", account.id)
/// }
/// ```
pub struct RequireAccount(pub Account);

impl FromRequestParts<AppState> for RequireAccount {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided.".to_owned())
        })?;

        authenticate(state, token).await.map(Self)
    }
}

/// Extractor for routes open to guests.
///
/// No `Authorization` header yields `None`; a header that is present must
/// carry a valid token.
pub struct OptionalAccount(pub Option<Account>);

impl FromRequestParts<AppState> for OptionalAccount {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(Self(None));
        }

        let token = bearer_token(&parts.headers)
            .ok_or(TokenError::Malformed)?;

        authenticate(state, token).await.map(|account| Self(Some(account)))
    }
}

async fn authenticate(state: &AppState, token: &str) -> Result<Account, AppError> {
    let identity = state.tokens().verify(token)?;

    let account = AccountRepository::new(state.pool())
        .resolve(identity.email.as_deref(), identity.subject.as_deref())
        .await?;

    set_sentry_user(&account.id, account.email.as_deref());
    tracing::debug!(account_id = %account.id, "Request authenticated");

    Ok(account)
}

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Ok(v) = HeaderValue::from_str(value) {
            map.insert(AUTHORIZATION, v);
        }
        map
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer  abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
