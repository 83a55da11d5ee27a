//! Bearer token verification.
//!
//! Tokens are HS256 JWTs minted by the front end's auth layer with a shared
//! secret. Only HS256 is accepted; `exp`/`nbf` are honored when present,
//! `aud` and `iss` must match the configuration.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

use crate::config::AuthConfig;

/// Errors that can occur when verifying a bearer token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("unsupported token algorithm: {0}")]
    Algorithm(String),

    #[error("token signature is invalid")]
    Signature,

    #[error("token has expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("token audience does not match")]
    Audience,

    #[error("token issuer does not match")]
    Issuer,

    #[error("token carries no email or subject")]
    NoIdentity,
}

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

#[derive(Debug, Default, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user: Option<UserClaim>,
    #[serde(default)]
    aud: Option<Value>,
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    nbf: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct UserClaim {
    #[serde(default)]
    email: Option<String>,
}

/// Identity carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub email: Option<String>,
    pub subject: Option<String>,
}

/// Verifies bearer tokens against the configured secret, audience and issuer.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: SecretString,
    audience: String,
    issuer: String,
    leeway: Duration,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("secret", &"[REDACTED]")
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("leeway", &self.leeway)
            .finish()
    }
}

impl TokenVerifier {
    /// Create a verifier from the auth configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            audience: config.audience.clone(),
            issuer: config.issuer.clone(),
            leeway: config.leeway,
        }
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] describing the first check that failed.
    pub fn verify(&self, token: &str) -> Result<TokenIdentity, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX));
        self.verify_at(token, now)
    }

    /// Verify a token as of `now` (seconds since the epoch).
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] describing the first check that failed.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<TokenIdentity, TokenError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let header: Header = decode_segment(header)?;
        if header.alg != "HS256" {
            return Err(TokenError::Algorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Signature)?;
        mac.update(signing_input(token).as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Signature)?;

        let claims: Claims = decode_segment(payload)?;
        self.check_claims(&claims, now)?;

        let email = claims
            .email
            .or_else(|| claims.user.and_then(|u| u.email))
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty());
        let subject = claims
            .sub
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());

        if email.is_none() && subject.is_none() {
            return Err(TokenError::NoIdentity);
        }

        Ok(TokenIdentity { email, subject })
    }

    fn check_claims(&self, claims: &Claims, now: i64) -> Result<(), TokenError> {
        let leeway = i64::try_from(self.leeway.as_secs()).unwrap_or(i64::MAX);

        if let Some(exp) = claims.exp
            && now.saturating_sub(leeway) >= exp
        {
            return Err(TokenError::Expired);
        }
        if let Some(nbf) = claims.nbf
            && now.saturating_add(leeway) < nbf
        {
            return Err(TokenError::NotYetValid);
        }

        let audience_ok = match &claims.aud {
            Some(Value::String(aud)) => *aud == self.audience,
            Some(Value::Array(values)) => values
                .iter()
                .any(|v| v.as_str() == Some(self.audience.as_str())),
            _ => false,
        };
        if !audience_ok {
            return Err(TokenError::Audience);
        }

        if claims.iss.as_deref() != Some(self.issuer.as_str()) {
            return Err(TokenError::Issuer);
        }

        Ok(())
    }
}

/// `{header}.{payload}` of a compact token.
fn signing_input(token: &str) -> &str {
    token.rsplit_once('.').map_or(token, |(input, _)| input)
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}
