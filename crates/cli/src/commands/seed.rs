//! Seed the hosting catalog from YAML files.
//!
//! # Usage
//!
//! ```bash
//! # Upsert plans by (category, name)
//! hostdeck seed plans --file data/plans.yaml
//!
//! # Replace every plan in the file's categories
//! hostdeck seed plans --file data/plans.yaml --reset
//!
//! # Upsert comparison rows for the web plans
//! hostdeck seed specs --file data/web_specs.yaml --category web
//! ```
//!
//! # File formats
//!
//! Plans:
//!
//! ```yaml
//! plans:
//!   - name: Starter Email
//!     category: email
//!     billing_cycle: monthly
//!     price: "3.95"
//!     popular: false
//!     features:
//!       - 50 GB Email Storage
//! ```
//!
//! Specs (`rows` are aligned with `labels`; the value is only kept for
//! `text` rows):
//!
//! ```yaml
//! labels: [Storage Space, CPU Cores, cPanel]
//! plans:
//!   Starter Cloud:
//!     - [text, Unlimited NVMe]
//!     - [text, "1"]
//!     - [check, ""]
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info, warn};

use hostdeck_api::db;
use hostdeck_core::{BillingCycle, PlanCategory, PlanId, SpecIcon};

use super::{CommandError, database_url};

/// Gap between consecutive `display_order` values.
const ORDER_STEP: i32 = 10;

/// Contents of a plans file.
#[derive(Debug, Deserialize)]
pub struct PlanFile {
    pub plans: Vec<PlanEntry>,
}

/// One plan in a plans file.
#[derive(Debug, Deserialize)]
pub struct PlanEntry {
    pub name: String,
    pub category: PlanCategory,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    pub price: Decimal,
    #[serde(default)]
    pub popular: bool,
    #[serde(default)]
    pub features: Vec<String>,
}

impl PlanEntry {
    /// Features as stored: one per line.
    fn features_text(&self) -> String {
        self.features
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Contents of a specs file.
#[derive(Debug, Deserialize)]
pub struct SpecFile {
    pub labels: Vec<String>,
    pub plans: BTreeMap<String, Vec<(SpecIcon, String)>>,
}

/// A comparison row ready to upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRow {
    pub label: String,
    pub value: String,
    pub icon: SpecIcon,
    pub display_order: i32,
}

/// Check a plans file before touching the database.
#[must_use]
pub fn validate_plans(file: &PlanFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, plan) in file.plans.iter().enumerate() {
        let name = plan.name.trim();
        if name.is_empty() {
            errors.push(format!("plans[{index}]: name is blank"));
        } else if name.chars().count() > 100 {
            errors.push(format!("plans[{index}]: name is longer than 100 characters"));
        }
        if plan.price.is_sign_negative() {
            errors.push(format!("{name}: price is negative"));
        }
        if plan.price.scale() > 2 {
            errors.push(format!("{name}: price has more than 2 decimal places"));
        }
        if !seen.insert((plan.category, name.to_owned())) {
            errors.push(format!("{name}: listed twice in category {}", plan.category));
        }
    }

    errors
}

/// Check a specs file before touching the database.
#[must_use]
pub fn validate_specs(file: &SpecFile) -> Vec<String> {
    let mut errors = Vec::new();

    let mut labels = HashSet::new();
    for label in &file.labels {
        if label.trim().is_empty() {
            errors.push("labels: blank label".to_owned());
        } else if !labels.insert(label.trim()) {
            errors.push(format!("labels: {label:?} listed twice"));
        }
    }

    for (plan, rows) in &file.plans {
        if rows.len() != file.labels.len() {
            errors.push(format!(
                "{plan}: {} rows for {} labels",
                rows.len(),
                file.labels.len()
            ));
        }
    }

    errors
}

/// Pair rows with labels: order is 10, 20, 30...; icon rows carry no value.
#[must_use]
pub fn spec_rows(labels: &[String], rows: &[(SpecIcon, String)]) -> Vec<SpecRow> {
    labels
        .iter()
        .zip(rows)
        .zip(1..)
        .map(|((label, (icon, value)), position)| SpecRow {
            label: label.trim().to_owned(),
            value: if *icon == SpecIcon::Text {
                value.trim().to_owned()
            } else {
                String::new()
            },
            icon: *icon,
            display_order: position * ORDER_STEP,
        })
        .collect()
}

/// Read and parse a YAML file.
async fn load<T: serde::de::DeserializeOwned>(file_path: &str) -> Result<T, CommandError> {
    let content = tokio::fs::read_to_string(Path::new(file_path))
        .await
        .map_err(|source| CommandError::Read {
            path: file_path.to_owned(),
            source,
        })?;
    Ok(serde_yaml::from_str(&content)?)
}

fn report(errors: &[String]) -> Result<(), CommandError> {
    if errors.is_empty() {
        info!("Configuration validated successfully");
        return Ok(());
    }
    error!("Configuration validation failed:");
    for err in errors {
        error!("  - {err}");
    }
    Err(CommandError::Invalid(errors.len()))
}

/// Seed hosting plans from a YAML file.
///
/// # Arguments
///
/// * `file_path` - Path to the plans file
/// * `reset` - Delete every plan in the file's categories first
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, or if a
/// database operation fails. Nothing is written in that case.
pub async fn plans(file_path: &str, reset: bool) -> Result<(), CommandError> {
    info!(path = %file_path, "Loading plans from file");
    let file: PlanFile = load(file_path).await?;
    info!(plans = file.plans.len(), "Parsed configuration");
    report(&validate_plans(&file))?;

    let pool = db::create_pool(&database_url()?).await?;
    info!("Connected to database");

    upsert_plans(&pool, &file, reset).await
}

async fn upsert_plans(pool: &PgPool, file: &PlanFile, reset: bool) -> Result<(), CommandError> {
    let mut tx = pool.begin().await?;

    if reset {
        let mut categories: Vec<PlanCategory> = Vec::new();
        for plan in &file.plans {
            if !categories.contains(&plan.category) {
                categories.push(plan.category);
            }
        }
        for category in categories {
            let deleted = sqlx::query("DELETE FROM hosting_plan WHERE category = $1")
                .bind(category)
                .execute(&mut *tx)
                .await?;
            warn!(%category, deleted = deleted.rows_affected(), "Deleted existing plans");
        }
    }

    for plan in &file.plans {
        let created = sqlx::query_scalar::<_, bool>(
            r"
            INSERT INTO hosting_plan (name, price, billing_cycle, category, features, is_popular)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (category, name) DO UPDATE SET
                price = EXCLUDED.price,
                billing_cycle = EXCLUDED.billing_cycle,
                features = EXCLUDED.features,
                is_popular = EXCLUDED.is_popular
            RETURNING (xmax = 0)
            ",
        )
        .bind(plan.name.trim())
        .bind(plan.price)
        .bind(plan.billing_cycle)
        .bind(plan.category)
        .bind(plan.features_text())
        .bind(plan.popular)
        .fetch_one(&mut *tx)
        .await?;

        let status = if created { "CREATED" } else { "UPDATED" };
        info!("{status}: {} ({})", plan.name.trim(), plan.category);
    }

    tx.commit().await?;
    info!("Plan seeding complete!");
    Ok(())
}

/// Seed comparison rows for the plans of one category.
///
/// Plans named in the file but missing from the category are reported and
/// skipped.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, or if a
/// database operation fails. Nothing is written in that case.
pub async fn specs(file_path: &str, category: PlanCategory, reset: bool) -> Result<(), CommandError> {
    info!(path = %file_path, %category, "Loading plan specs from file");
    let file: SpecFile = load(file_path).await?;
    info!(plans = file.plans.len(), labels = file.labels.len(), "Parsed configuration");
    report(&validate_specs(&file))?;

    let pool = db::create_pool(&database_url()?).await?;
    info!("Connected to database");

    upsert_specs(&pool, &file, category, reset).await
}

async fn upsert_specs(
    pool: &PgPool,
    file: &SpecFile,
    category: PlanCategory,
    reset: bool,
) -> Result<(), CommandError> {
    let mut tx = pool.begin().await?;

    let wanted: Vec<&str> = file.plans.keys().map(String::as_str).collect();
    let plans = sqlx::query_as::<_, (PlanId, String)>(
        "SELECT id, name FROM hosting_plan WHERE category = $1 AND name = ANY($2) ORDER BY id",
    )
    .bind(category)
    .bind(&wanted)
    .fetch_all(&mut *tx)
    .await?;

    let found: HashSet<&str> = plans.iter().map(|(_, name)| name.as_str()).collect();
    let missing: Vec<&str> = wanted.iter().copied().filter(|n| !found.contains(n)).collect();
    if !missing.is_empty() {
        warn!(%category, ?missing, "Plans not found in category");
    }

    if reset && !plans.is_empty() {
        let ids: Vec<i32> = plans.iter().map(|(id, _)| id.as_i32()).collect();
        let deleted = sqlx::query("DELETE FROM plan_spec WHERE plan_id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;
        warn!(deleted = deleted.rows_affected(), "Existing plan specs deleted for matched plans");
    }

    for (plan_id, name) in &plans {
        let Some(rows) = file.plans.get(name) else {
            continue;
        };

        let (mut created, mut updated) = (0_u32, 0_u32);
        for row in spec_rows(&file.labels, rows) {
            let was_created = sqlx::query_scalar::<_, bool>(
                r"
                INSERT INTO plan_spec (plan_id, label, value, icon, display_order)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (plan_id, label) DO UPDATE SET
                    value = EXCLUDED.value,
                    icon = EXCLUDED.icon,
                    display_order = EXCLUDED.display_order
                RETURNING (xmax = 0)
                ",
            )
            .bind(plan_id)
            .bind(&row.label)
            .bind(&row.value)
            .bind(row.icon)
            .bind(row.display_order)
            .fetch_one(&mut *tx)
            .await?;

            if was_created {
                created += 1;
            } else {
                updated += 1;
            }
        }

        info!("{name}: {created} created, {updated} updated plan spec rows");
    }

    tx.commit().await?;
    info!("Plan spec seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_file_parses_with_defaults() {
        let file: PlanFile = serde_yaml::from_str(
            r#"
plans:
  - name: Starter Email
    category: email
    price: "3.95"
    features:
      - 50 GB Email Storage
      - "  "
      - 2 Email Accounts
"#,
        )
        .unwrap();

        let plan = &file.plans[0];
        assert_eq!(plan.billing_cycle, BillingCycle::Monthly);
        assert!(!plan.popular);
        assert_eq!(plan.features_text(), "50 GB Email Storage\n2 Email Accounts");
        assert!(validate_plans(&file).is_empty());
    }

    #[test]
    fn test_validate_plans_reports_each_problem() {
        let file: PlanFile = serde_yaml::from_str(
            r#"
plans:
  - { name: "Web", category: web, price: "-1" }
  - { name: "Web", category: web, price: "2.999" }
  - { name: " ", category: email, price: "1" }
"#,
        )
        .unwrap();

        let errors = validate_plans(&file);
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("negative")));
        assert!(errors.iter().any(|e| e.contains("2 decimal places")));
        assert!(errors.iter().any(|e| e.contains("listed twice")));
        assert!(errors.iter().any(|e| e.contains("blank")));
    }

    #[test]
    fn test_spec_rows_orders_and_clears_icon_values() {
        let labels = vec!["Storage".to_owned(), "cPanel".to_owned(), "RAM".to_owned()];
        let rows = vec![
            (SpecIcon::Text, "Unlimited".to_owned()),
            (SpecIcon::Check, "ignored".to_owned()),
            (SpecIcon::Text, " 2GB ".to_owned()),
        ];

        let out = spec_rows(&labels, &rows);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].display_order, 10);
        assert_eq!(out[1].display_order, 20);
        assert_eq!(out[1].value, "");
        assert_eq!(out[1].icon, SpecIcon::Check);
        assert_eq!(out[2].value, "2GB");
        assert_eq!(out[2].display_order, 30);
    }

    #[test]
    fn test_spec_file_rows_must_match_labels() {
        let file: SpecFile = serde_yaml::from_str(
            r#"
labels: [Storage, cPanel]
plans:
  Starter Cloud:
    - [text, Unlimited]
    - [check, ""]
  Plus Cloud:
    - [text, Unlimited]
"#,
        )
        .unwrap();

        let errors = validate_specs(&file);
        assert_eq!(errors, vec!["Plus Cloud: 1 rows for 2 labels".to_owned()]);
    }
}
