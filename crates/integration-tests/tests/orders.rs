//! Integration tests for the order aggregate.
//!
//! These tests require a scratch `PostgreSQL` database in
//! `HOSTDECK_TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p hostdeck-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use serde_json::json;

use hostdeck_api::db::OrderRepository;
use hostdeck_api::db::orders::Settlement;
use hostdeck_core::cart::{Cart, CartItemInput};
use hostdeck_core::{CurrencyCode, CustomerRef, OrderStatus, PaymentStatus};
use hostdeck_integration_tests::{test_pool, unique_email};

fn cart() -> Cart {
    let inputs: Vec<CartItemInput> = serde_json::from_value(json!([
        {"item_type": "plan", "name": "Plus Cloud", "sku": "plus-cloud", "quantity": 2, "unit_amount_cents": 499},
        {"item_type": "domain", "name": "example.com", "sku": "example.com", "quantity": 1, "unit_amount_cents": 1299, "currency": "USD"},
    ]))
    .unwrap();
    Cart::from_inputs(inputs, &CurrencyCode::parse("usd").unwrap()).unwrap()
}

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_pending_order_stores_server_total() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let customer = CustomerRef::from_identity(Some(&unique_email("buyer")), None);
    let repo = OrderRepository::new(&pool);

    let (view, payment_id) = repo.create_pending(&customer, &cart()).await.unwrap();
    assert_eq!(view.order.status, OrderStatus::Pending);
    assert_eq!(view.order.total_amount_cents, 2 * 499 + 1299);
    assert_eq!(view.order.currency, "usd");
    assert_eq!(view.items.len(), 2);
    assert_eq!(view.items[0].name, "Plus Cloud");

    let payment = repo.payment(view.order.id).await.unwrap().expect("payment row");
    assert_eq!(payment.id, payment_id);
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.amount_cents, view.order.total_amount_cents);
}

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_settle_is_applied_once() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let customer = CustomerRef::from_identity(Some(&unique_email("settle")), None);
    let repo = OrderRepository::new(&pool);

    let (view, payment_id) = repo.create_pending(&customer, &cart()).await.unwrap();
    let session = format!("cs_test_{payment_id}");
    repo.attach_session(payment_id, &session).await.unwrap();
    assert_eq!(repo.order_for_session(&session).await.unwrap(), Some(view.order.id));

    let first = repo
        .settle(view.order.id, OrderStatus::Paid, Some("pi_123"))
        .await
        .unwrap();
    assert_eq!(first, Settlement::Applied);

    // A late failure event must not undo the payment.
    let second = repo
        .settle(view.order.id, OrderStatus::Failed, None)
        .await
        .unwrap();
    assert_eq!(second, Settlement::AlreadySettled(OrderStatus::Paid));

    let stored = repo.get_for(view.order.id, &customer).await.unwrap().unwrap();
    assert_eq!(stored.order.status, OrderStatus::Paid);

    let payment = repo.payment(view.order.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Succeeded);
    assert_eq!(payment.provider_payment_intent.as_deref(), Some("pi_123"));
}

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_orders_are_scoped_to_customer() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let alice = CustomerRef::from_identity(Some(&unique_email("alice")), None);
    let bob = CustomerRef::from_identity(Some(&unique_email("bob")), None);
    let repo = OrderRepository::new(&pool);

    let (first, _) = repo.create_pending(&alice, &cart()).await.unwrap();
    let (second, _) = repo.create_pending(&alice, &cart()).await.unwrap();

    let listed = repo.list_for(&alice).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|o| o.order.id).collect();
    assert_eq!(ids, vec![second.order.id, first.order.id]);
    assert!(listed.iter().all(|o| o.items.len() == 2));

    assert!(repo.list_for(&bob).await.unwrap().is_empty());
    assert!(repo.get_for(first.order.id, &bob).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_unknown_order_is_reported() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let outcome = OrderRepository::new(&pool)
        .settle(hostdeck_core::OrderId::new(i32::MAX), OrderStatus::Canceled, None)
        .await
        .unwrap();
    assert_eq!(outcome, Settlement::UnknownOrder);
}
