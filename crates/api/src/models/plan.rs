//! Hosting plan catalog rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use hostdeck_core::{BillingCycle, PlanCategory, PlanId, PlanSpecId, SpecIcon};

/// A hosting plan as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HostingPlan {
    pub id: PlanId,
    pub name: String,
    pub price: Decimal,
    pub billing_cycle: BillingCycle,
    pub category: PlanCategory,
    /// Raw feature text, one feature per `;` or line.
    pub features: String,
    pub is_popular: bool,
    pub created_at: DateTime<Utc>,
}

impl HostingPlan {
    /// Features split on `;` and newlines, trimmed, blanks dropped.
    #[must_use]
    pub fn feature_list(&self) -> Vec<String> {
        split_features(&self.features)
    }
}

/// Split a raw feature string into individual features.
#[must_use]
pub fn split_features(raw: &str) -> Vec<String> {
    raw.split([';', '\n'])
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(String::from)
        .collect()
}

/// JSON shape of a plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanView {
    pub id: PlanId,
    pub name: String,
    pub price: Decimal,
    pub billing_cycle: BillingCycle,
    pub category: PlanCategory,
    pub is_popular: bool,
    pub feature_list: Vec<String>,
}

impl From<&HostingPlan> for PlanView {
    fn from(plan: &HostingPlan) -> Self {
        Self {
            id: plan.id,
            name: plan.name.clone(),
            price: plan.price,
            billing_cycle: plan.billing_cycle,
            category: plan.category,
            is_popular: plan.is_popular,
            feature_list: plan.feature_list(),
        }
    }
}

/// One comparison-table row for a plan.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PlanSpec {
    pub id: PlanSpecId,
    #[serde(skip)]
    pub plan_id: PlanId,
    pub label: String,
    /// Shown only when `icon` is `text`.
    pub value: String,
    pub icon: SpecIcon,
    #[serde(rename = "order")]
    pub display_order: i32,
}

/// A plan together with its comparison rows, ordered by `display_order`.
#[derive(Debug, Clone, Serialize)]
pub struct PlanWithSpecs {
    #[serde(flatten)]
    pub plan: PlanView,
    pub specs: Vec<PlanSpec>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_split_features_accepts_both_separators() {
        assert_eq!(
            split_features("50 GB Storage; 2 Accounts\nWebmail\n\n ; "),
            vec!["50 GB Storage", "2 Accounts", "Webmail"]
        );
        assert!(split_features("").is_empty());
    }

    #[test]
    fn test_plan_view_serializes_price_as_string() {
        let plan = HostingPlan {
            id: PlanId::new(3),
            name: "Starter Cloud".to_owned(),
            price: Decimal::from_str("2.99").unwrap(),
            billing_cycle: BillingCycle::Monthly,
            category: PlanCategory::Web,
            features: "Free SSL;1 Website".to_owned(),
            is_popular: true,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(PlanView::from(&plan)).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["price"], "2.99");
        assert_eq!(json["billing_cycle"], "monthly");
        assert_eq!(json["category"], "web");
        assert_eq!(json["feature_list"][1], "1 Website");
    }
}
