//! Hosting plan catalog queries.
//!
//! The catalog is read-only at runtime; `hostdeck seed` is the only writer.

use std::collections::HashMap;

use sqlx::PgPool;

use hostdeck_core::{PlanCategory, PlanId};

use super::RepositoryError;
use crate::models::{HostingPlan, PlanSpec, PlanView, PlanWithSpecs};

const PLAN_COLUMNS: &str =
    "id, name, price, billing_cycle, category, features, is_popular, created_at";

/// Repository for the plan catalog.
pub struct PlanRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PlanRepository<'a> {
    /// Create a new plan repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List plans, optionally restricted to one category.
    ///
    /// Ordered by category, then price, then id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        category: Option<PlanCategory>,
    ) -> Result<Vec<HostingPlan>, RepositoryError> {
        let plans = sqlx::query_as::<_, HostingPlan>(&format!(
            r"
            SELECT {PLAN_COLUMNS}
            FROM hosting_plan
            WHERE $1::plan_category IS NULL OR category = $1
            ORDER BY category, price, id
            "
        ))
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        Ok(plans)
    }

    /// Get one plan by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PlanId) -> Result<Option<HostingPlan>, RepositoryError> {
        let plan = sqlx::query_as::<_, HostingPlan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM hosting_plan WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(plan)
    }

    /// List plans with their comparison rows.
    ///
    /// Rows are ordered by `display_order`, then id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_with_specs(
        &self,
        category: Option<PlanCategory>,
    ) -> Result<Vec<PlanWithSpecs>, RepositoryError> {
        let plans = self.list(category).await?;
        let ids: Vec<i32> = plans.iter().map(|p| p.id.as_i32()).collect();

        let specs = sqlx::query_as::<_, PlanSpec>(
            r"
            SELECT id, plan_id, label, value, icon, display_order
            FROM plan_spec
            WHERE plan_id = ANY($1)
            ORDER BY plan_id, display_order, id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(attach_specs(&plans, specs))
    }
}

/// Group spec rows under their plans, keeping plan order and row order.
fn attach_specs(plans: &[HostingPlan], specs: Vec<PlanSpec>) -> Vec<PlanWithSpecs> {
    let mut by_plan: HashMap<PlanId, Vec<PlanSpec>> = HashMap::new();
    for spec in specs {
        by_plan.entry(spec.plan_id).or_default().push(spec);
    }

    plans
        .iter()
        .map(|plan| PlanWithSpecs {
            plan: PlanView::from(plan),
            specs: by_plan.remove(&plan.id).unwrap_or_default(),
        })
        .collect()
}
