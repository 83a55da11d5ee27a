//! Page repository.

use sqlx::PgPool;

use hostdeck_core::{AccountId, PageId, ProjectId};

use super::RepositoryError;
use crate::models::Page;
use crate::models::builder::{NewPage, PageChanges};

const PAGE_COLUMNS: &str = "id, project_id, name, slug, path, position, meta_title, \
     meta_description, created_at, updated_at";

const DUPLICATE_SLUG: &str = "A page with this slug already exists in the project.";

/// Repository for site-builder pages.
pub struct PageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PageRepository<'a> {
    /// Create a new page repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List pages in the account's projects, optionally for one project.
    ///
    /// Ordered by position, then id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for(
        &self,
        account: AccountId,
        project: Option<ProjectId>,
    ) -> Result<Vec<Page>, RepositoryError> {
        let pages = sqlx::query_as::<_, Page>(
            r"
            SELECT pg.id, pg.project_id, pg.name, pg.slug, pg.path, pg.position,
                   pg.meta_title, pg.meta_description, pg.created_at, pg.updated_at
            FROM page pg
            JOIN project p ON p.id = pg.project_id
            WHERE p.account_id = $1
              AND ($2::INTEGER IS NULL OR pg.project_id = $2)
            ORDER BY pg.position, pg.id
            ",
        )
        .bind(account)
        .bind(project)
        .fetch_all(self.pool)
        .await?;

        Ok(pages)
    }

    /// Get a page by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the page does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PageId) -> Result<Page, RepositoryError> {
        sqlx::query_as::<_, Page>(&format!("SELECT {PAGE_COLUMNS} FROM page WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Create a page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken in the project.
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &NewPage) -> Result<Page, RepositoryError> {
        let page = sqlx::query_as::<_, Page>(&format!(
            r"
            INSERT INTO page (project_id, name, slug, path, position, meta_title, meta_description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PAGE_COLUMNS}
            "
        ))
        .bind(input.project)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.path)
        .bind(input.position)
        .bind(&input.meta_title)
        .bind(&input.meta_description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_or(e, DUPLICATE_SLUG))?;

        touch_project(self.pool, page.project_id).await?;
        Ok(page)
    }

    /// Apply the fields present in `changes`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the page does not exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(&self, id: PageId, changes: &PageChanges) -> Result<Page, RepositoryError> {
        let page = sqlx::query_as::<_, Page>(&format!(
            r"
            UPDATE page SET
                project_id = COALESCE($2, project_id),
                name = COALESCE($3, name),
                slug = COALESCE($4, slug),
                path = COALESCE($5, path),
                position = COALESCE($6, position),
                meta_title = COALESCE($7, meta_title),
                meta_description = COALESCE($8, meta_description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PAGE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.project)
        .bind(changes.name.as_deref())
        .bind(changes.slug.as_deref())
        .bind(changes.path.as_deref())
        .bind(changes.position)
        .bind(changes.meta_title.as_deref())
        .bind(changes.meta_description.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_or(e, DUPLICATE_SLUG))?
        .ok_or(RepositoryError::NotFound)?;

        touch_project(self.pool, page.project_id).await?;
        Ok(page)
    }

    /// Delete a page and its blocks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the page does not exist.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: PageId) -> Result<(), RepositoryError> {
        let project = sqlx::query_scalar::<_, ProjectId>(
            "DELETE FROM page WHERE id = $1 RETURNING project_id",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        touch_project(self.pool, project).await
    }
}

/// Bump a project's `updated_at` after a change to its content.
pub(crate) async fn touch_project<'e, E>(executor: E, id: ProjectId) -> Result<(), RepositoryError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query("UPDATE project SET updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
