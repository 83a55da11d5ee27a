//! Project repository.
//!
//! Callers check ownership with [`super::ensure_owned`] before touching a
//! project by id; listing is already scoped to the account.

use sqlx::PgPool;

use hostdeck_core::{AccountId, ProjectId};

use super::RepositoryError;
use crate::models::Project;
use crate::models::builder::{NewProject, ProjectChanges};

const PROJECT_SELECT: &str = r"
    SELECT p.id, p.account_id, p.name, p.template_slug, p.is_published, p.domain,
           p.settings, p.created_at, p.updated_at,
           (SELECT COUNT(*) FROM page WHERE page.project_id = p.id) AS pages_count
    FROM project p
";

/// Repository for site-builder projects.
pub struct ProjectRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProjectRepository<'a> {
    /// Create a new project repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List an account's projects, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for(&self, account: AccountId) -> Result<Vec<Project>, RepositoryError> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "{PROJECT_SELECT} WHERE p.account_id = $1 ORDER BY p.updated_at DESC, p.id DESC"
        ))
        .bind(account)
        .fetch_all(self.pool)
        .await?;

        Ok(projects)
    }

    /// Get a project by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the project does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProjectId) -> Result<Project, RepositoryError> {
        sqlx::query_as::<_, Project>(&format!("{PROJECT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Create a project owned by `account`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        account: AccountId,
        input: &NewProject,
    ) -> Result<Project, RepositoryError> {
        let id = sqlx::query_scalar::<_, ProjectId>(
            r"
            INSERT INTO project (account_id, name, template_slug, is_published, domain, settings)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(account)
        .bind(&input.name)
        .bind(&input.template_slug)
        .bind(input.is_published)
        .bind(&input.domain)
        .bind(&input.settings)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(project_id = %id, account_id = %account, "Project created");
        self.get(id).await
    }

    /// Apply the fields present in `changes`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the project does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ProjectId,
        changes: &ProjectChanges,
    ) -> Result<Project, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE project SET
                name = COALESCE($2, name),
                template_slug = COALESCE($3, template_slug),
                is_published = COALESCE($4, is_published),
                domain = COALESCE($5, domain),
                settings = COALESCE($6, settings),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.template_slug.as_deref())
        .bind(changes.is_published)
        .bind(changes.domain.as_deref())
        .bind(&changes.settings)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await
    }

    /// Delete a project; its pages and blocks go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the project does not exist.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ProjectId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM project WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tracing::info!(project_id = %id, "Project deleted");
        Ok(())
    }
}
