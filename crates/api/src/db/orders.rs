//! Order aggregate persistence: order, line items and payment.
//!
//! Orders are created `pending` by checkout and leave that state only
//! through [`OrderRepository::settle`], which the payment webhook drives.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};

use hostdeck_core::cart::Cart;
use hostdeck_core::{CustomerRef, OrderId, OrderStatus, PaymentId};

use super::RepositoryError;
use crate::models::{Order, OrderItem, OrderView, Payment};

const ORDER_COLUMNS: &str = "id, user_ref, currency, total_amount_cents, status, created_at";
const ITEM_COLUMNS: &str =
    "id, order_id, item_type, name, sku, quantity, unit_amount_cents, currency";
const PAYMENT_COLUMNS: &str = "id, order_id, provider, provider_session_id, \
     provider_payment_intent, status, amount_cents, created_at";

/// Result of applying a payment outcome to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The order moved out of `pending`.
    Applied,
    /// The order was already settled and was left unchanged.
    AlreadySettled(OrderStatus),
    /// No order with that id exists.
    UnknownOrder,
}

/// Repository for orders and their payments.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a `pending` order, its items and a `pending` payment in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is
    /// written in that case.
    pub async fn create_pending(
        &self,
        customer: &CustomerRef,
        cart: &Cart,
    ) -> Result<(OrderView, PaymentId), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO customer_order (user_ref, currency, total_amount_cents, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(customer.as_str())
        .bind(cart.currency.as_str())
        .bind(cart.total_amount_cents)
        .fetch_one(&mut *tx)
        .await?;

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO order_item \
             (order_id, item_type, name, sku, quantity, unit_amount_cents, currency) ",
        );
        builder.push_values(&cart.items, |mut row, item| {
            row.push_bind(order.id)
                .push_bind(item.item_type)
                .push_bind(&item.name)
                .push_bind(&item.sku)
                .push_bind(item.quantity)
                .push_bind(item.unit_amount_cents)
                .push_bind(item.currency.as_str());
        });
        builder.push(" RETURNING ");
        builder.push(ITEM_COLUMNS);
        let mut items = builder
            .build_query_as::<OrderItem>()
            .fetch_all(&mut *tx)
            .await?;
        items.sort_by_key(|item| item.id);

        let payment_id = sqlx::query_scalar::<_, PaymentId>(
            r"
            INSERT INTO payment (order_id, provider, status, amount_cents)
            VALUES ($1, 'stripe', 'pending', $2)
            RETURNING id
            ",
        )
        .bind(order.id)
        .bind(cart.total_amount_cents)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            total_amount_cents = order.total_amount_cents,
            items = items.len(),
            "Order created"
        );

        Ok((OrderView { order, items }, payment_id))
    }

    /// Store the provider's checkout session id on the payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the payment does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn attach_session(
        &self,
        payment_id: PaymentId,
        session_id: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE payment SET provider_session_id = $2 WHERE id = $1")
            .bind(payment_id)
            .bind(session_id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::conflict_or(e, "checkout session already recorded"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Move a `pending` order and its payment to a final state.
    ///
    /// Orders that are already settled keep their status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if `status` is `pending`.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn settle(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        payment_intent: Option<&str>,
    ) -> Result<Settlement, RepositoryError> {
        if !OrderStatus::Pending.can_transition_to(status) {
            return Err(RepositoryError::DataCorruption(format!(
                "cannot settle an order as {status}"
            )));
        }

        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM customer_order WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(Settlement::UnknownOrder);
        };
        if current.is_terminal() {
            return Ok(Settlement::AlreadySettled(current));
        }

        sqlx::query("UPDATE customer_order SET status = $2 WHERE id = $1 AND status = 'pending'")
            .bind(order_id)
            .bind(status)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r"
            UPDATE payment
            SET status = $2,
                provider_payment_intent = COALESCE($3, provider_payment_intent)
            WHERE order_id = $1
            ",
        )
        .bind(order_id)
        .bind(status.payment_status())
        .bind(payment_intent)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(order_id = %order_id, status = %status, "Order settled");
        Ok(Settlement::Applied)
    }

    /// Find the order a checkout session belongs to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn order_for_session(
        &self,
        session_id: &str,
    ) -> Result<Option<OrderId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, OrderId>(
            "SELECT order_id FROM payment WHERE provider_session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(id)
    }

    /// Get the payment for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn payment(&self, order_id: OrderId) -> Result<Option<Payment>, RepositoryError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payment WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(payment)
    }

    /// List a customer's orders with their items, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for(&self, customer: &CustomerRef) -> Result<Vec<OrderView>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM customer_order
            WHERE user_ref = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(customer.as_str())
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = orders.iter().map(|o| o.id.as_i32()).collect();
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_item WHERE order_id = ANY($1) ORDER BY order_id, id"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(group_items(orders, items))
    }

    /// Get one of a customer's orders.
    ///
    /// Orders placed under another customer reference are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for(
        &self,
        id: OrderId,
        customer: &CustomerRef,
    ) -> Result<Option<OrderView>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order WHERE id = $1 AND user_ref = $2"
        ))
        .bind(id)
        .bind(customer.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_item WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order.id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(OrderView { order, items }))
    }
}

fn group_items(orders: Vec<Order>, items: Vec<OrderItem>) -> Vec<OrderView> {
    let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }

    orders
        .into_iter()
        .map(|order| {
            let items = by_order.remove(&order.id).unwrap_or_default();
            OrderView { order, items }
        })
        .collect()
}
