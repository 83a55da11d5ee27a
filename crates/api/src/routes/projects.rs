//! Site-builder project routes.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use tracing::instrument;

use hostdeck_core::ProjectId;

use crate::db::{ProjectRepository, ensure_owned};
use crate::error::{AppError, Result};
use crate::middleware::RequireAccount;
use crate::models::Project;
use crate::models::builder::{NewProject, ProjectChanges};
use crate::routes::extract::{JsonBody, PathParam};
use crate::state::AppState;

/// Create the project routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(create))
        .route("/{id}", get(show).patch(update).delete(destroy))
}

/// List the caller's projects, most recently updated first.
///
/// GET /projects
#[instrument(skip_all, fields(account_id = %account.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
) -> Result<Json<Vec<Project>>> {
    let projects = ProjectRepository::new(state.pool())
        .list_for(account.id)
        .await?;
    Ok(Json(projects))
}

/// POST /projects
#[instrument(skip_all, fields(account_id = %account.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    JsonBody(input): JsonBody<NewProject>,
) -> Result<(StatusCode, Json<Project>)> {
    let input = input.validate().map_err(AppError::BadRequest)?;
    let project = ProjectRepository::new(state.pool())
        .create(account.id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /projects/{id}
#[instrument(skip_all, fields(account_id = %account.id, project_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    PathParam(id): PathParam<ProjectId>,
) -> Result<Json<Project>> {
    ensure_owned::<Project, _>(state.pool(), id, account.id).await?;
    let project = ProjectRepository::new(state.pool()).get(id).await?;
    Ok(Json(project))
}

/// PATCH /projects/{id}
#[instrument(skip_all, fields(account_id = %account.id, project_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    PathParam(id): PathParam<ProjectId>,
    JsonBody(changes): JsonBody<ProjectChanges>,
) -> Result<Json<Project>> {
    let changes = changes.validate().map_err(AppError::BadRequest)?;
    ensure_owned::<Project, _>(state.pool(), id, account.id).await?;
    let project = ProjectRepository::new(state.pool())
        .update(id, &changes)
        .await?;
    Ok(Json(project))
}

/// Delete a project with its pages and blocks.
///
/// DELETE /projects/{id}
#[instrument(skip_all, fields(account_id = %account.id, project_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    PathParam(id): PathParam<ProjectId>,
) -> Result<StatusCode> {
    ensure_owned::<Project, _>(state.pool(), id, account.id).await?;
    ProjectRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
