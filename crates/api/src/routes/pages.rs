//! Site-builder page routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use hostdeck_core::{PageId, ProjectId};

use crate::db::{PageRepository, ensure_owned};
use crate::error::{AppError, Result};
use crate::middleware::RequireAccount;
use crate::models::builder::{NewPage, PageChanges};
use crate::models::{Page, Project};
use crate::routes::blocks;
use crate::routes::extract::{JsonBody, PathParam, QueryParams};
use crate::state::AppState;

/// Create the page routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(create))
        .route("/{id}", get(show).patch(update).delete(destroy))
        .route("/{id}/sync-blocks", post(blocks::sync))
}

/// `GET /pages` filter.
#[derive(Debug, Default, Deserialize)]
pub struct PageFilter {
    pub project: Option<String>,
}

/// A parent filter from the query string.
///
/// A value that is not an id matches nothing rather than failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParentFilter<T> {
    All,
    Only(T),
    Nothing,
}

impl<T: std::str::FromStr> ParentFilter<T> {
    pub(crate) fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).filter(|v| !v.is_empty()) {
            None => Self::All,
            Some(v) => v.parse().map_or(Self::Nothing, Self::Only),
        }
    }
}

/// List the caller's pages, optionally for one project.
///
/// GET /pages?project=12
#[instrument(skip_all, fields(account_id = %account.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    QueryParams(filter): QueryParams<PageFilter>,
) -> Result<Json<Vec<Page>>> {
    let project = match ParentFilter::<ProjectId>::parse(filter.project.as_deref()) {
        ParentFilter::All => None,
        ParentFilter::Only(id) => Some(id),
        ParentFilter::Nothing => return Ok(Json(Vec::new())),
    };

    let pages = PageRepository::new(state.pool())
        .list_for(account.id, project)
        .await?;
    Ok(Json(pages))
}

/// POST /pages
#[instrument(skip_all, fields(account_id = %account.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    JsonBody(input): JsonBody<NewPage>,
) -> Result<(StatusCode, Json<Page>)> {
    let input = input.validate().map_err(AppError::BadRequest)?;
    ensure_owned::<Project, _>(state.pool(), input.project, account.id).await?;

    let page = PageRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

/// GET /pages/{id}
#[instrument(skip_all, fields(account_id = %account.id, page_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    PathParam(id): PathParam<PageId>,
) -> Result<Json<Page>> {
    ensure_owned::<Page, _>(state.pool(), id, account.id).await?;
    let page = PageRepository::new(state.pool()).get(id).await?;
    Ok(Json(page))
}

/// Update a page. Moving it to another project requires owning that project.
///
/// PATCH /pages/{id}
#[instrument(skip_all, fields(account_id = %account.id, page_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    PathParam(id): PathParam<PageId>,
    JsonBody(changes): JsonBody<PageChanges>,
) -> Result<Json<Page>> {
    let changes = changes.validate().map_err(AppError::BadRequest)?;
    ensure_owned::<Page, _>(state.pool(), id, account.id).await?;
    if let Some(project) = changes.project {
        ensure_owned::<Project, _>(state.pool(), project, account.id).await?;
    }

    let page = PageRepository::new(state.pool())
        .update(id, &changes)
        .await?;
    Ok(Json(page))
}

/// DELETE /pages/{id}
#[instrument(skip_all, fields(account_id = %account.id, page_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    PathParam(id): PathParam<PageId>,
) -> Result<StatusCode> {
    ensure_owned::<Page, _>(state.pool(), id, account.id).await?;
    PageRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
