//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness
//! GET    /health/ready              - Readiness (database)
//!
//! # Catalog
//! GET    /plans                     - Plans (?category=)
//! GET    /plans/specs               - Plans with comparison rows (?category=)
//! GET    /plans/{id}                - Plan detail
//!
//! # Checkout
//! POST   /checkout/session          - Create order and hosted checkout session
//! POST   /checkout/stripe/webhook   - Payment provider callback
//! GET    /orders                    - Caller's orders (auth)
//! GET    /orders/{id}               - Caller's order (auth)
//!
//! # Domains (rate limited)
//! GET    /domain/check              - Availability (?q=)
//! GET    /domain/suggest            - Spinner suggestions
//! GET    /domain/suggest2           - Keyword suggestions
//!
//! # Site builder (auth)
//! GET    /projects                  - List / POST create
//! GET    /projects/{id}             - Detail / PATCH / DELETE
//! GET    /pages                     - List (?project=) / POST create
//! GET    /pages/{id}                - Detail / PATCH / DELETE
//! POST   /pages/{id}/sync-blocks    - Replace or append a page's blocks
//! GET    /blocks                    - List (?page=) / POST create
//! GET    /blocks/{id}               - Detail / PATCH / DELETE
//! ```

pub mod blocks;
pub mod checkout;
pub mod domains;
pub mod extract;
pub mod orders;
pub mod pages;
pub mod plans;
pub mod projects;

use axum::{
    Router,
    extract::State,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    routing::get,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/plans", plans::router())
        .nest("/checkout", checkout::router())
        .nest("/orders", orders::router())
        .nest("/domain", domains::router())
        .nest("/projects", projects::router())
        .nest("/pages", pages::router())
        .nest("/blocks", blocks::router())
}

/// Build the full application: routes, health checks and the middleware stack.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors_origins);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for the configured front-end origins. With no origins configured
/// no cross-origin request is allowed.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| {
            HeaderValue::from_str(o)
                .inspect_err(|_| tracing::warn!(origin = %o, "Ignoring invalid CORS origin"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
