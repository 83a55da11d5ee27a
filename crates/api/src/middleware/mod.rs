//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (reuse or generate `x-request-id`)
//! 4. CORS (configured origins only)
//! 5. Rate limiting on `/domain/*` (governor)
//!
//! Authentication is an extractor, not a layer: see [`RequireAccount`].

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{OptionalAccount, RequireAccount};
pub use rate_limit::domain_rate_limiter;
pub use request_id::request_id_middleware;
