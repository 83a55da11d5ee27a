//! Account repository.
//!
//! Accounts are never registered here. A row appears the first time a valid
//! bearer token names an email or subject we have not seen before.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::Account;

/// Repository for local accounts.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find or create the account for a token identity.
    ///
    /// A known subject wins; an email is attached to it if the account had
    /// none. Otherwise email matches case-insensitively, and a new row is
    /// created when neither is known.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if both identifiers are absent.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn resolve(
        &self,
        email: Option<&str>,
        subject: Option<&str>,
    ) -> Result<Account, RepositoryError> {
        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_lowercase);
        let subject = subject.map(str::trim).filter(|s| !s.is_empty());

        if let Some(subject) = subject
            && let Some(account) = self.find_by_subject(subject).await?
        {
            return match (email.as_deref(), &account.email) {
                (Some(email), None) => self.attach_email(account, email).await,
                _ => Ok(account),
            };
        }

        match (email.as_deref(), subject) {
            (Some(email), subject) => self.upsert_by_email(email, subject).await,
            (None, Some(subject)) => self.upsert_by_subject(subject).await,
            (None, None) => Err(RepositoryError::DataCorruption(
                "token carries neither email nor subject".to_owned(),
            )),
        }
    }

    async fn find_by_subject(&self, subject: &str) -> Result<Option<Account>, RepositoryError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, subject, created_at FROM account WHERE subject = $1",
        )
        .bind(subject)
        .fetch_optional(self.pool)
        .await?;

        Ok(account)
    }

    async fn attach_email(&self, account: Account, email: &str) -> Result<Account, RepositoryError> {
        // Another account may already own the email; keep the subject match then.
        let updated = sqlx::query_as::<_, Account>(
            r"
            UPDATE account SET email = $2
            WHERE id = $1
              AND email IS NULL
              AND NOT EXISTS (SELECT 1 FROM account WHERE LOWER(email) = $2)
            RETURNING id, email, subject, created_at
            ",
        )
        .bind(account.id)
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(updated.unwrap_or(account))
    }

    async fn upsert_by_email(
        &self,
        email: &str,
        subject: Option<&str>,
    ) -> Result<Account, RepositoryError> {
        // The update makes RETURNING yield the existing row on conflict.
        let account = sqlx::query_as::<_, Account>(
            r"
            INSERT INTO account (email, subject)
            VALUES ($1, $2)
            ON CONFLICT (LOWER(email)) WHERE email IS NOT NULL
            DO UPDATE SET subject = COALESCE(account.subject, EXCLUDED.subject)
            RETURNING id, email, subject, created_at
            ",
        )
        .bind(email)
        .bind(subject)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::conflict_or(e, "subject already linked to another account")
        })?;

        Ok(account)
    }

    async fn upsert_by_subject(&self, subject: &str) -> Result<Account, RepositoryError> {
        let account = sqlx::query_as::<_, Account>(
            r"
            INSERT INTO account (subject)
            VALUES ($1)
            ON CONFLICT (subject) WHERE subject IS NOT NULL
            DO UPDATE SET subject = EXCLUDED.subject
            RETURNING id, email, subject, created_at
            ",
        )
        .bind(subject)
        .fetch_one(self.pool)
        .await?;

        Ok(account)
    }
}
