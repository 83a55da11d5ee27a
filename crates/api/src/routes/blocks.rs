//! Site-builder block routes, including the bulk page sync.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use hostdeck_core::builder::{BlockDescriptor, SyncMode, normalize_blocks};
use hostdeck_core::{BlockId, PageId};

use crate::db::{BlockRepository, ensure_owned};
use crate::error::{AppError, Result};
use crate::middleware::RequireAccount;
use crate::models::builder::{BlockChanges, NewBlock};
use crate::models::{Block, Page};
use crate::routes::extract::{JsonBody, PathParam, QueryParams};
use crate::routes::pages::ParentFilter;
use crate::state::AppState;

/// Create the block routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(create))
        .route("/{id}", get(show).patch(update).delete(destroy))
}

/// `GET /blocks` filter.
#[derive(Debug, Default, Deserialize)]
pub struct BlockFilter {
    pub page: Option<String>,
}

/// Body of `POST /pages/{id}/sync-blocks`.
#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    /// Delete existing blocks first. Defaults to `true`.
    #[serde(default)]
    pub replace: Option<bool>,
    #[serde(default)]
    pub blocks: Vec<BlockDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub code: &'static str,
    pub message: &'static str,
    pub count: usize,
}

/// List the caller's blocks, optionally for one page.
///
/// GET /blocks?page=7
#[instrument(skip_all, fields(account_id = %account.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    QueryParams(filter): QueryParams<BlockFilter>,
) -> Result<Json<Vec<Block>>> {
    let page = match ParentFilter::<PageId>::parse(filter.page.as_deref()) {
        ParentFilter::All => None,
        ParentFilter::Only(id) => Some(id),
        ParentFilter::Nothing => return Ok(Json(Vec::new())),
    };

    let blocks = BlockRepository::new(state.pool())
        .list_for(account.id, page)
        .await?;
    Ok(Json(blocks))
}

/// POST /blocks
#[instrument(skip_all, fields(account_id = %account.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    JsonBody(input): JsonBody<NewBlock>,
) -> Result<(StatusCode, Json<Block>)> {
    let input = input.validate().map_err(AppError::BadRequest)?;
    ensure_owned::<Page, _>(state.pool(), input.page, account.id).await?;

    let block = BlockRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

/// GET /blocks/{id}
#[instrument(skip_all, fields(account_id = %account.id, block_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    PathParam(id): PathParam<BlockId>,
) -> Result<Json<Block>> {
    ensure_owned::<Block, _>(state.pool(), id, account.id).await?;
    let block = BlockRepository::new(state.pool()).get(id).await?;
    Ok(Json(block))
}

/// PATCH /blocks/{id}
#[instrument(skip_all, fields(account_id = %account.id, block_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    PathParam(id): PathParam<BlockId>,
    JsonBody(changes): JsonBody<BlockChanges>,
) -> Result<Json<Block>> {
    let changes = changes.validate().map_err(AppError::BadRequest)?;
    ensure_owned::<Block, _>(state.pool(), id, account.id).await?;
    if let Some(page) = changes.page {
        ensure_owned::<Page, _>(state.pool(), page, account.id).await?;
    }

    let block = BlockRepository::new(state.pool())
        .update(id, &changes)
        .await?;
    Ok(Json(block))
}

/// DELETE /blocks/{id}
#[instrument(skip_all, fields(account_id = %account.id, block_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    PathParam(id): PathParam<BlockId>,
) -> Result<StatusCode> {
    ensure_owned::<Block, _>(state.pool(), id, account.id).await?;
    BlockRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Write all of a page's blocks in one transaction.
///
/// POST /pages/{id}/sync-blocks
///
/// Every descriptor is validated before the database is touched; a bad key
/// anywhere in the list leaves the page unchanged.
#[instrument(skip_all, fields(account_id = %account.id, page_id = %id))]
pub async fn sync(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    PathParam(id): PathParam<PageId>,
    JsonBody(request): JsonBody<SyncRequest>,
) -> Result<Json<SyncResponse>> {
    let blocks = normalize_blocks(&request.blocks)?;
    let mode = SyncMode::from_replace_flag(request.replace);

    let count = BlockRepository::new(state.pool())
        .sync(account.id, id, mode, &blocks)
        .await?;

    Ok(Json(SyncResponse {
        code: "ok",
        message: "Blocks synced.",
        count,
    }))
}
