//! Payment provider (Stripe) client.
//!
//! Only hosted Checkout is used: the API creates a session for a pending
//! order and hands the customer the session URL. The provider reports the
//! result through the webhook in [`webhook`].

pub mod webhook;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use hostdeck_core::OrderId;

use crate::config::PaymentConfig;
use crate::models::OrderView;

/// Placeholder in `success_url` replaced with the order id.
pub const ORDER_ID_PLACEHOLDER: &str = "{ORDER_ID}";

/// Errors that can occur when talking to the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Transport failure or timeout.
    #[error("Payment provider request failed: {0}")]
    Request(String),

    /// The provider rejected the request.
    #[error("Payment provider error: {0}")]
    Api(String),

    /// The provider's response could not be decoded.
    #[error("Payment provider response error: {0}")]
    Response(String),

    /// Webhook signature missing, malformed, stale or wrong.
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// Webhook body is not a recognizable event.
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// The client could not be configured.
    #[error("Payment configuration error: {0}")]
    Config(String),
}

/// A created hosted checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: String,
    secret_key: SecretString,
    webhook_secret: SecretString,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base)
            .field("secret_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
        })
    }

    /// The secret used to verify webhook signatures.
    #[must_use]
    pub const fn webhook_secret(&self) -> &SecretString {
        &self.webhook_secret
    }

    /// Create a hosted checkout session for a pending order.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the provider rejects it.
    #[instrument(skip(self, order, success_url, cancel_url), fields(order_id = %order.order.id))]
    pub async fn create_checkout_session(
        &self,
        order: &OrderView,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        let form = checkout_form(order, success_url, cancel_url);

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            tracing::error!(status = status.as_u16(), error = %message, "Checkout session rejected");
            return Err(PaymentError::Api(message));
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| PaymentError::Response(e.without_url().to_string()))?;

        tracing::info!(session_id = %session.id, "Checkout session created");
        Ok(session)
    }
}

/// Substitute the order id into a success URL.
#[must_use]
pub fn success_url_for(template: &str, order_id: OrderId) -> String {
    template.replace(ORDER_ID_PLACEHOLDER, &order_id.to_string())
}

/// Form fields for `POST /v1/checkout/sessions`.
fn checkout_form(order: &OrderView, success_url: &str, cancel_url: &str) -> Vec<(String, String)> {
    let order_id = order.order.id;
    let mut form = vec![
        ("mode".to_owned(), "payment".to_owned()),
        ("success_url".to_owned(), success_url_for(success_url, order_id)),
        ("cancel_url".to_owned(), cancel_url.to_owned()),
        ("client_reference_id".to_owned(), order_id.to_string()),
        ("metadata[order_id]".to_owned(), order_id.to_string()),
    ];

    for (i, item) in order.items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.extend([
            (format!("{prefix}[quantity]"), item.quantity.to_string()),
            (format!("{prefix}[price_data][currency]"), item.currency.clone()),
            (
                format!("{prefix}[price_data][unit_amount]"),
                item.unit_amount_cents.to_string(),
            ),
            (format!("{prefix}[price_data][product_data][name]"), item.name.clone()),
            (
                format!("{prefix}[price_data][product_data][metadata][sku]"),
                item.sku.clone(),
            ),
            (
                format!("{prefix}[price_data][product_data][metadata][item_type]"),
                item.item_type.to_string(),
            ),
        ]);
    }

    form
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use httpmock::prelude::*;

    use hostdeck_core::{CurrencyCode, LineItemType, OrderItemId, OrderStatus};

    use super::*;
    use crate::models::{Order, OrderItem};

    fn order_view() -> OrderView {
        OrderView {
            order: Order {
                id: OrderId::new(42),
                user_ref: "a@example.com".to_owned(),
                currency: "usd".to_owned(),
                total_amount_cents: 1298,
                status: OrderStatus::Pending,
                created_at: Utc::now(),
            },
            items: vec![
                OrderItem {
                    id: OrderItemId::new(1),
                    order_id: OrderId::new(42),
                    item_type: LineItemType::Plan,
                    name: "Web Basic".to_owned(),
                    sku: "plan_3".to_owned(),
                    quantity: 1,
                    unit_amount_cents: 299,
                    currency: "usd".to_owned(),
                },
                OrderItem {
                    id: OrderItemId::new(2),
                    order_id: OrderId::new(42),
                    item_type: LineItemType::Domain,
                    name: "example.com".to_owned(),
                    sku: "example.com".to_owned(),
                    quantity: 1,
                    unit_amount_cents: 999,
                    currency: "usd".to_owned(),
                },
            ],
        }
    }

    fn client_for(server: &MockServer) -> StripeClient {
        StripeClient::new(&PaymentConfig {
            secret_key: SecretString::from("sk_test_abc"),
            webhook_secret: SecretString::from("whsec_abc"),
            currency: CurrencyCode::default(),
            api_base: server.base_url(),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[test]
    fn test_checkout_form_encodes_items_and_order_id() {
        let form = checkout_form(
            &order_view(),
            "https://shop.example/checkout?order_id={ORDER_ID}",
            "https://shop.example/cart",
        );
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };

        assert_eq!(get("mode"), "payment");
        assert_eq!(get("success_url"), "https://shop.example/checkout?order_id=42");
        assert_eq!(get("metadata[order_id]"), "42");
        assert_eq!(get("line_items[1][price_data][unit_amount]"), "999");
        assert_eq!(
            get("line_items[0][price_data][product_data][metadata][item_type]"),
            "plan"
        );
    }

    #[tokio::test]
    async fn test_create_checkout_session() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/checkout/sessions")
                    .header("authorization", "Bearer sk_test_abc")
                    .x_www_form_urlencoded_tuple("metadata[order_id]", "42");
                then.status(200).json_body(serde_json::json!({
                    "id": "cs_test_1",
                    "url": "https://checkout.stripe.com/c/pay/cs_test_1"
                }));
            })
            .await;

        let session = client_for(&server)
            .create_checkout_session(&order_view(), "https://a.example/ok", "https://a.example/no")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(session.id, "cs_test_1");
    }

    #[tokio::test]
    async fn test_provider_error_message_is_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/checkout/sessions");
                then.status(400).json_body(serde_json::json!({
                    "error": {"message": "Invalid currency: zzz"}
                }));
            })
            .await;

        let err = client_for(&server)
            .create_checkout_session(&order_view(), "https://a.example/ok", "https://a.example/no")
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Api(ref m) if m == "Invalid currency: zzz"));
    }
}
