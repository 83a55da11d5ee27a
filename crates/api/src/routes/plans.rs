//! Hosting plan catalog routes.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Deserialize;
use tracing::instrument;

use hostdeck_core::{PlanCategory, PlanId};

use crate::error::{AppError, Result};
use crate::models::{PlanView, PlanWithSpecs};
use crate::routes::extract::{PathParam, QueryParams};
use crate::state::AppState;

/// Create the plan routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/specs", get(specs))
        .route("/{id}", get(show))
}

/// `?category=` filter shared by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryFilter {
    pub category: Option<String>,
}

impl CategoryFilter {
    fn category(&self) -> Result<Option<PlanCategory>> {
        match self.category.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .to_lowercase()
                .parse()
                .map(Some)
                .map_err(|e: hostdeck_core::UnknownVariant| AppError::BadRequest(e.to_string())),
        }
    }
}

/// List plans.
///
/// GET /plans?category=web
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<CategoryFilter>,
) -> Result<Json<Arc<Vec<PlanView>>>> {
    let plans = state.catalog().plans(filter.category()?).await?;
    Ok(Json(plans))
}

/// List plans with their comparison rows.
///
/// GET /plans/specs?category=web
#[instrument(skip(state))]
pub async fn specs(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<CategoryFilter>,
) -> Result<Json<Arc<Vec<PlanWithSpecs>>>> {
    let plans = state.catalog().plans_with_specs(filter.category()?).await?;
    Ok(Json(plans))
}

/// Get one plan.
///
/// GET /plans/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<PlanId>,
) -> Result<Json<Arc<PlanView>>> {
    state
        .catalog()
        .plan(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Plan not found".to_owned()))
}
