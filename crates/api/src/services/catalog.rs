//! Read-through cache over the plan catalog.
//!
//! The catalog only changes when `hostdeck seed` runs, so results are kept
//! for five minutes using `moka`.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use hostdeck_core::{PlanCategory, PlanId};

use crate::db::{PlanRepository, RepositoryError};
use crate::models::{PlanView, PlanWithSpecs};

/// Cache key for catalog queries.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Plans(Option<PlanCategory>),
    Plan(PlanId),
    PlansWithSpecs(Option<PlanCategory>),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Plans(Arc<Vec<PlanView>>),
    Plan(Arc<PlanView>),
    PlansWithSpecs(Arc<Vec<PlanWithSpecs>>),
}

/// Plan catalog with a 5-minute cache in front of the database.
#[derive(Clone)]
pub struct PlanCatalog {
    pool: PgPool,
    cache: Cache<CacheKey, CacheValue>,
}

impl PlanCatalog {
    /// Create a catalog reading from `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self { pool, cache }
    }

    /// Plans, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self))]
    pub async fn plans(
        &self,
        category: Option<PlanCategory>,
    ) -> Result<Arc<Vec<PlanView>>, RepositoryError> {
        let key = CacheKey::Plans(category);
        if let Some(CacheValue::Plans(plans)) = self.cache.get(&key).await {
            debug!("Cache hit for plans");
            return Ok(plans);
        }

        let plans = PlanRepository::new(&self.pool).list(category).await?;
        let plans = Arc::new(plans.iter().map(PlanView::from).collect::<Vec<_>>());

        self.cache.insert(key, CacheValue::Plans(Arc::clone(&plans))).await;
        Ok(plans)
    }

    /// One plan, or `None` when no such plan exists. Misses are not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self), fields(plan_id = %id))]
    pub async fn plan(&self, id: PlanId) -> Result<Option<Arc<PlanView>>, RepositoryError> {
        let key = CacheKey::Plan(id);
        if let Some(CacheValue::Plan(plan)) = self.cache.get(&key).await {
            debug!("Cache hit for plan");
            return Ok(Some(plan));
        }

        let Some(plan) = PlanRepository::new(&self.pool).get(id).await? else {
            return Ok(None);
        };
        let plan = Arc::new(PlanView::from(&plan));

        self.cache.insert(key, CacheValue::Plan(Arc::clone(&plan))).await;
        Ok(Some(plan))
    }

    /// Plans with their comparison rows.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    #[instrument(skip(self))]
    pub async fn plans_with_specs(
        &self,
        category: Option<PlanCategory>,
    ) -> Result<Arc<Vec<PlanWithSpecs>>, RepositoryError> {
        let key = CacheKey::PlansWithSpecs(category);
        if let Some(CacheValue::PlansWithSpecs(plans)) = self.cache.get(&key).await {
            debug!("Cache hit for plan specs");
            return Ok(plans);
        }

        let plans = Arc::new(
            PlanRepository::new(&self.pool)
                .list_with_specs(category)
                .await?,
        );

        self.cache
            .insert(key, CacheValue::PlansWithSpecs(Arc::clone(&plans)))
            .await;
        Ok(plans)
    }
}
