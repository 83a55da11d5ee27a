//! Order history routes for the authenticated customer.

use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

use hostdeck_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAccount;
use crate::models::OrderView;
use crate::routes::extract::PathParam;
use crate::state::AppState;

/// Create the order routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/{id}", get(show))
}

/// List the caller's orders, newest first.
///
/// GET /orders
#[instrument(skip(state, account), fields(account_id = %account.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
) -> Result<Json<Vec<OrderView>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for(&account.customer_ref())
        .await?;
    Ok(Json(orders))
}

/// Get one of the caller's orders.
///
/// GET /orders/{id}
#[instrument(skip(state, account), fields(account_id = %account.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    PathParam(id): PathParam<OrderId>,
) -> Result<Json<OrderView>> {
    OrderRepository::new(state.pool())
        .get_for(id, &account.customer_ref())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))
}
