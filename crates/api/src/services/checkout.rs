//! Checkout: turn a cart into a pending order and a hosted payment page.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use hostdeck_core::cart::{Cart, CartError, CartItemInput};
use hostdeck_core::{CurrencyCode, CustomerRef};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::OrderView;
use crate::payments::{PaymentError, StripeClient};

/// Errors that can occur while starting a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart failed validation.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// A redirect URL is missing or not absolute http(s).
    #[error("{0} must be an absolute http(s) URL")]
    InvalidUrl(&'static str),

    /// Persisting the order failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The payment provider refused or could not be reached.
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// Body of `POST /checkout/session`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CartItemInput>,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

/// Response of `POST /checkout/session`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub order: OrderView,
}

/// A checkout request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidCheckout {
    pub cart: Cart,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutRequest {
    /// Validate items and redirect URLs against the store currency.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Cart` or `CheckoutError::InvalidUrl`.
    pub fn validate(self, currency: &CurrencyCode) -> Result<ValidCheckout, CheckoutError> {
        let cart = Cart::from_inputs(self.items, currency)?;
        let success_url = absolute_url("success_url", self.success_url)?;
        let cancel_url = absolute_url("cancel_url", self.cancel_url)?;

        Ok(ValidCheckout {
            cart,
            success_url,
            cancel_url,
        })
    }
}

fn absolute_url(field: &'static str, value: Option<String>) -> Result<String, CheckoutError> {
    let value = value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(CheckoutError::InvalidUrl(field))?;

    // `{ORDER_ID}` is substituted later; braces must survive the check.
    let probe = value.replace(crate::payments::ORDER_ID_PLACEHOLDER, "0");
    match Url::parse(&probe) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(value),
        _ => Err(CheckoutError::InvalidUrl(field)),
    }
}

/// Create the order aggregate, then the hosted checkout session.
///
/// The order is committed before the provider is called; if the provider
/// fails the order stays `pending` with no session.
///
/// # Errors
///
/// Returns `CheckoutError::Repository` if the order cannot be stored.
/// Returns `CheckoutError::Payment` if the session cannot be created.
#[instrument(skip(pool, stripe, checkout), fields(customer = %customer, total = checkout.cart.total_amount_cents))]
pub async fn start_checkout(
    pool: &PgPool,
    stripe: &StripeClient,
    customer: &CustomerRef,
    checkout: ValidCheckout,
) -> Result<CheckoutResponse, CheckoutError> {
    let orders = OrderRepository::new(pool);
    let (order, payment_id) = orders.create_pending(customer, &checkout.cart).await?;

    let session = stripe
        .create_checkout_session(&order, &checkout.success_url, &checkout.cancel_url)
        .await
        .inspect_err(|e| {
            tracing::warn!(order_id = %order.order.id, error = %e, "Order left pending without a session");
        })?;

    orders.attach_session(payment_id, &session.id).await?;

    Ok(CheckoutResponse {
        checkout_url: session.url,
        order,
    })
}
