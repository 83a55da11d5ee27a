//! Checkout and payment webhook routes.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use hostdeck_core::CustomerRef;

use crate::db::OrderRepository;
use crate::db::orders::Settlement;
use crate::error::Result;
use crate::middleware::OptionalAccount;
use crate::models::Account;
use crate::payments::PaymentError;
use crate::payments::webhook::{WebhookEvent, verify_signature};
use crate::routes::extract::JsonBody;
use crate::services::checkout::{self, CheckoutRequest, CheckoutResponse};
use crate::state::AppState;

/// Header carrying the webhook signature.
const SIGNATURE_HEADER: &str = "stripe-signature";

/// Create the checkout routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", post(create_session))
        .route("/stripe/webhook", post(stripe_webhook))
}

/// Create a pending order and a hosted checkout session.
///
/// POST /checkout/session
///
/// Guests may check out; their orders are recorded under `guest`.
#[instrument(skip(state, account, request))]
pub async fn create_session(
    State(state): State<AppState>,
    OptionalAccount(account): OptionalAccount,
    JsonBody(request): JsonBody<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    let customer = account
        .as_ref()
        .map_or_else(|| CustomerRef::from_identity(None, None), Account::customer_ref);

    let valid = request.validate(&state.config().payments.currency)?;
    let response = checkout::start_checkout(state.pool(), state.stripe(), &customer, valid).await?;

    info!(order_id = %response.order.order.id, customer = %customer, "Checkout session created");
    Ok((StatusCode::CREATED, Json(response)))
}

/// Apply checkout-session outcomes to orders.
///
/// POST /checkout/stripe/webhook
///
/// Events for unknown or already-settled orders are acknowledged so the
/// provider stops retrying them.
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| PaymentError::InvalidSignature("Missing Stripe-Signature header".to_owned()))?;

    verify_signature(
        state.stripe().webhook_secret(),
        signature,
        &body,
        chrono::Utc::now().timestamp(),
    )?;

    let event = WebhookEvent::from_slice(&body)?;
    let Some(status) = event.order_outcome() else {
        debug!(event_id = %event.id, event_type = %event.event_type, "Ignoring webhook event");
        return Ok(received());
    };

    let session = &event.data.object;
    let orders = OrderRepository::new(state.pool());

    let order_id = match (session.order_id(), session.id.as_deref()) {
        (Some(id), _) => Some(id),
        (None, Some(session_id)) => orders.order_for_session(session_id).await?,
        (None, None) => None,
    };

    let Some(order_id) = order_id else {
        warn!(event_id = %event.id, "Webhook event does not reference an order");
        return Ok(received());
    };

    match orders
        .settle(order_id, status, session.payment_intent.as_deref())
        .await?
    {
        Settlement::Applied => {
            info!(event_id = %event.id, order_id = %order_id, status = %status, "Payment outcome applied");
        }
        Settlement::AlreadySettled(current) => {
            info!(order_id = %order_id, current = %current, "Order already settled, event ignored");
        }
        Settlement::UnknownOrder => {
            warn!(event_id = %event.id, order_id = %order_id, "Webhook event for unknown order");
        }
    }

    Ok(received())
}

fn received() -> Json<Value> {
    Json(json!({ "received": true }))
}
