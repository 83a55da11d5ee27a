//! Block repository, including the bulk page sync.

use sqlx::{PgPool, Postgres, QueryBuilder};

use hostdeck_core::builder::{BlockSpec, SyncMode};
use hostdeck_core::{AccountId, BlockId, PageId, ProjectId};

use super::RepositoryError;
use super::ownership::{AccessError, ensure_owned};
use super::pages::touch_project;
use crate::models::builder::{ValidBlock, ValidBlockChanges};
use crate::models::{Block, Page};

const BLOCK_COLUMNS: &str = "id, page_id, key, enabled, position, props, created_at, updated_at";

const DUPLICATE_BLOCK: &str = "A block with this key and position already exists on the page.";

/// Repository for page blocks.
pub struct BlockRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlockRepository<'a> {
    /// Create a new block repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List blocks on the account's pages, optionally for one page.
    ///
    /// Ordered by position, then id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for(
        &self,
        account: AccountId,
        page: Option<PageId>,
    ) -> Result<Vec<Block>, RepositoryError> {
        let blocks = sqlx::query_as::<_, Block>(
            r"
            SELECT b.id, b.page_id, b.key, b.enabled, b.position, b.props,
                   b.created_at, b.updated_at
            FROM block b
            JOIN page pg ON pg.id = b.page_id
            JOIN project p ON p.id = pg.project_id
            WHERE p.account_id = $1
              AND ($2::INTEGER IS NULL OR b.page_id = $2)
            ORDER BY b.position, b.id
            ",
        )
        .bind(account)
        .bind(page)
        .fetch_all(self.pool)
        .await?;

        Ok(blocks)
    }

    /// Get a block by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the block does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BlockId) -> Result<Block, RepositoryError> {
        sqlx::query_as::<_, Block>(&format!("SELECT {BLOCK_COLUMNS} FROM block WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Create one block.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `(page, key, position)` is taken.
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ValidBlock) -> Result<Block, RepositoryError> {
        let block = sqlx::query_as::<_, Block>(&format!(
            r"
            INSERT INTO block (page_id, key, enabled, position, props)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {BLOCK_COLUMNS}
            "
        ))
        .bind(input.page)
        .bind(input.key)
        .bind(input.enabled)
        .bind(input.position)
        .bind(&input.props)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_or(e, DUPLICATE_BLOCK))?;

        Ok(block)
    }

    /// Apply the fields present in `changes`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the block does not exist.
    /// Returns `RepositoryError::Conflict` if `(page, key, position)` is taken.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: BlockId,
        changes: &ValidBlockChanges,
    ) -> Result<Block, RepositoryError> {
        sqlx::query_as::<_, Block>(&format!(
            r"
            UPDATE block SET
                page_id = COALESCE($2, page_id),
                key = COALESCE($3, key),
                enabled = COALESCE($4, enabled),
                position = COALESCE($5, position),
                props = COALESCE($6, props),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BLOCK_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.page)
        .bind(changes.key)
        .bind(changes.enabled)
        .bind(changes.position)
        .bind(&changes.props)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_or(e, DUPLICATE_BLOCK))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a block.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the block does not exist.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: BlockId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM block WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Write a page's blocks in one transaction.
    ///
    /// The ownership check runs inside the transaction. In
    /// [`SyncMode::Replace`] the page's existing blocks are deleted first.
    /// Any failure rolls the whole sync back.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::NotFound` or `AccessError::Forbidden` if the page
    /// is missing or not owned by `account`.
    /// Returns `AccessError::Repository` with `RepositoryError::Conflict` if
    /// two blocks share `(key, position)`.
    pub async fn sync(
        &self,
        account: AccountId,
        page: PageId,
        mode: SyncMode,
        blocks: &[BlockSpec],
    ) -> Result<usize, AccessError> {
        let mut tx = self.pool.begin().await?;

        ensure_owned::<Page, _>(&mut *tx, page, account).await?;

        if mode == SyncMode::Replace {
            let removed = sqlx::query("DELETE FROM block WHERE page_id = $1")
                .bind(page)
                .execute(&mut *tx)
                .await?;
            tracing::debug!(page_id = %page, removed = removed.rows_affected(), "Cleared page blocks");
        }

        if !blocks.is_empty() {
            let mut builder: QueryBuilder<'_, Postgres> =
                QueryBuilder::new("INSERT INTO block (page_id, key, enabled, position, props) ");
            builder.push_values(blocks, |mut row, block| {
                row.push_bind(page)
                    .push_bind(block.key)
                    .push_bind(block.enabled)
                    .push_bind(block.position)
                    .push_bind(block.props.clone());
            });
            builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::conflict_or(e, DUPLICATE_BLOCK))?;
        }

        let project = sqlx::query_scalar::<_, ProjectId>(
            "SELECT project_id FROM page WHERE id = $1",
        )
        .bind(page)
        .fetch_one(&mut *tx)
        .await?;
        touch_project(&mut *tx, project).await?;

        tx.commit().await?;

        tracing::info!(page_id = %page, count = blocks.len(), ?mode, "Blocks synced");
        Ok(blocks.len())
    }
}
