//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::payments::{PaymentError, StripeClient};
use crate::registrar::{RegistrarClient, RegistrarError};
use crate::services::{PlanCatalog, TokenVerifier};

/// Error building the outbound clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("registrar client: {0}")]
    Registrar(#[from] RegistrarError),
    #[error("payment client: {0}")]
    Payment(#[from] PaymentError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    registrar: RegistrarClient,
    stripe: StripeClient,
    tokens: TokenVerifier,
    catalog: PlanCatalog,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the registrar or payment client cannot be built.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let registrar = RegistrarClient::new(&config.registrar)?;
        let stripe = StripeClient::new(&config.payments)?;
        let tokens = TokenVerifier::new(&config.auth);
        let catalog = PlanCatalog::new(pool.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                registrar,
                stripe,
                tokens,
                catalog,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the registrar client.
    #[must_use]
    pub fn registrar(&self) -> &RegistrarClient {
        &self.inner.registrar
    }

    /// Get a reference to the payment provider client.
    #[must_use]
    pub fn stripe(&self) -> &StripeClient {
        &self.inner.stripe
    }

    /// Get a reference to the bearer token verifier.
    #[must_use]
    pub fn tokens(&self) -> &TokenVerifier {
        &self.inner.tokens
    }

    /// Get a reference to the cached plan catalog.
    #[must_use]
    pub fn catalog(&self) -> &PlanCatalog {
        &self.inner.catalog
    }
}
