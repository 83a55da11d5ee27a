//! Integration tests for the plan catalog queries.
//!
//! These tests require a scratch `PostgreSQL` database in
//! `HOSTDECK_TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p hostdeck-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use sqlx::PgPool;

use hostdeck_api::db::PlanRepository;
use hostdeck_core::{PlanCategory, PlanId, SpecIcon};
use hostdeck_integration_tests::test_pool;

async fn insert_plan(pool: &PgPool, name: &str, price: &str, features: &str) -> PlanId {
    sqlx::query_scalar::<_, PlanId>(
        r"
        INSERT INTO hosting_plan (name, price, category, features)
        VALUES ($1, $2::NUMERIC, 'woocommerce', $3)
        RETURNING id
        ",
    )
    .bind(name)
    .bind(price)
    .bind(features)
    .fetch_one(pool)
    .await
    .expect("Failed to insert plan")
}

async fn insert_spec(pool: &PgPool, plan: PlanId, label: &str, icon: SpecIcon, order: i32) {
    sqlx::query(
        "INSERT INTO plan_spec (plan_id, label, value, icon, display_order) VALUES ($1, $2, 'x', $3, $4)",
    )
    .bind(plan)
    .bind(label)
    .bind(icon)
    .bind(order)
    .execute(pool)
    .await
    .expect("Failed to insert spec");
}

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_plans_are_ordered_by_price_within_category() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let run = uuid::Uuid::new_v4().simple().to_string();

    let pricey = insert_plan(&pool, &format!("Pricey {run}"), "99.00", "A;B").await;
    let cheap = insert_plan(&pool, &format!("Cheap {run}"), "0.50", "C\nD").await;

    let plans = PlanRepository::new(&pool)
        .list(Some(PlanCategory::Woocommerce))
        .await
        .unwrap();
    assert!(plans.iter().all(|p| p.category == PlanCategory::Woocommerce));

    let position = |id: PlanId| plans.iter().position(|p| p.id == id).unwrap();
    assert!(position(cheap) < position(pricey));

    let cheap_row = &plans[position(cheap)];
    assert_eq!(cheap_row.feature_list(), vec!["C", "D"]);
    assert!(!cheap_row.is_popular);

    let others = PlanRepository::new(&pool)
        .list(Some(PlanCategory::Email))
        .await
        .unwrap();
    assert!(others.iter().all(|p| p.id != cheap && p.id != pricey));
}

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_specs_follow_display_order() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let run = uuid::Uuid::new_v4().simple().to_string();

    let plan = insert_plan(&pool, &format!("Specced {run}"), "5.00", "").await;
    insert_spec(&pool, plan, "RAM", SpecIcon::Text, 20).await;
    insert_spec(&pool, plan, "Storage", SpecIcon::Text, 10).await;
    insert_spec(&pool, plan, "cPanel", SpecIcon::Check, 30).await;

    let with_specs = PlanRepository::new(&pool)
        .list_with_specs(Some(PlanCategory::Woocommerce))
        .await
        .unwrap();
    let entry = with_specs
        .iter()
        .find(|p| p.plan.id == plan)
        .expect("plan should be listed");

    let labels: Vec<_> = entry.specs.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Storage", "RAM", "cPanel"]);
    assert_eq!(entry.specs[2].icon, SpecIcon::Check);
}

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_missing_plan_is_none() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let plan = PlanRepository::new(&pool)
        .get(PlanId::new(i32::MAX))
        .await
        .unwrap();
    assert!(plan.is_none());
}
