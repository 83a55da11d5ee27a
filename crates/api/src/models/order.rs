//! Order aggregate rows: order, line items and the single payment.

use chrono::{DateTime, Utc};
use serde::Serialize;

use hostdeck_core::{
    LineItemType, OrderId, OrderItemId, OrderStatus, PaymentId, PaymentStatus,
};

/// An order header.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// Email, token subject or `guest`.
    pub user_ref: String,
    pub currency: String,
    /// Sum of quantity × unit amount, in minor units, fixed at creation.
    pub total_amount_cents: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// One line of an order.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    #[serde(skip)]
    pub order_id: OrderId,
    pub item_type: LineItemType,
    pub name: String,
    pub sku: String,
    pub quantity: i32,
    pub unit_amount_cents: i64,
    pub currency: String,
}

/// The payment attached to an order.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub provider: String,
    pub provider_session_id: Option<String>,
    pub provider_payment_intent: Option<String>,
    pub status: PaymentStatus,
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// JSON shape of an order with its items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
