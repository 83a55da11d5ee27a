//! Local accounts resolved from bearer tokens.

use chrono::{DateTime, Utc};

use hostdeck_core::{AccountId, CustomerRef};

/// A local account.
///
/// Created the first time a token with a new email or subject is seen.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: AccountId,
    /// Lower-cased email, when the token carried one.
    pub email: Option<String>,
    /// Token subject, when the token carried one.
    pub subject: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// The reference written on orders placed by this account.
    #[must_use]
    pub fn customer_ref(&self) -> CustomerRef {
        CustomerRef::from_identity(self.email.as_deref(), self.subject.as_deref())
    }
}
