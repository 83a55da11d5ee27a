//! Ownership checks for site-builder resources.
//!
//! Every project, page and block belongs to exactly one account through its
//! project. [`ensure_owned`] is the single predicate used before any read or
//! write of those rows: a missing row is `NotFound`, a row owned by somebody
//! else is `Forbidden`.

use sqlx::PgExecutor;
use thiserror::Error;

use hostdeck_core::{AccountId, BlockId, PageId, ProjectId};

use super::RepositoryError;
use crate::models::{Block, Page, Project};

/// Outcome of an ownership check that did not pass.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The resource exists but belongs to another account.
    #[error("You do not own this {}.", .0.to_lowercase())]
    Forbidden(&'static str),

    /// The lookup itself failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for AccessError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// A row whose owning account can be looked up by id.
pub trait OwnedResource {
    /// Typed id of the resource.
    type Id: Into<i32> + Copy + Send;

    /// Name used in error messages.
    const KIND: &'static str;

    /// Query selecting the owning `account_id` for the id bound as `$1`.
    const OWNER_SQL: &'static str;
}

impl OwnedResource for Project {
    type Id = ProjectId;
    const KIND: &'static str = "Project";
    const OWNER_SQL: &'static str = "SELECT account_id FROM project WHERE id = $1";
}

impl OwnedResource for Page {
    type Id = PageId;
    const KIND: &'static str = "Page";
    const OWNER_SQL: &'static str = r"
        SELECT p.account_id
        FROM page pg
        JOIN project p ON p.id = pg.project_id
        WHERE pg.id = $1
    ";
}

impl OwnedResource for Block {
    type Id = BlockId;
    const KIND: &'static str = "Block";
    const OWNER_SQL: &'static str = r"
        SELECT p.account_id
        FROM block b
        JOIN page pg ON pg.id = b.page_id
        JOIN project p ON p.id = pg.project_id
        WHERE b.id = $1
    ";
}

/// Check that `account` owns the resource `id`.
///
/// Accepts a pool or an open transaction.
///
/// # Errors
///
/// Returns `AccessError::NotFound` if the resource does not exist.
/// Returns `AccessError::Forbidden` if another account owns it.
/// Returns `AccessError::Repository` if the query fails.
pub async fn ensure_owned<'e, R, E>(
    executor: E,
    id: R::Id,
    account: AccountId,
) -> Result<(), AccessError>
where
    R: OwnedResource,
    E: PgExecutor<'e>,
{
    let owner = sqlx::query_scalar::<_, AccountId>(R::OWNER_SQL)
        .bind(Into::<i32>::into(id))
        .fetch_optional(executor)
        .await?;

    check_owner(R::KIND, owner, account)
}

fn check_owner(
    kind: &'static str,
    owner: Option<AccountId>,
    account: AccountId,
) -> Result<(), AccessError> {
    match owner {
        None => Err(AccessError::NotFound(kind)),
        Some(owner) if owner == account => Ok(()),
        Some(_) => Err(AccessError::Forbidden(kind)),
    }
}
