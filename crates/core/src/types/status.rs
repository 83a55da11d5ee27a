//! Enumerations stored in the database and exchanged over the API.
//!
//! Every enum serializes as its lower-case wire name (`"monthly"`,
//! `"woocommerce"`, `"pending"`, ...) and, with the `postgres` feature, maps to
//! a Postgres enum type of the same name.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a variant of one of these enums.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value:?}")]
pub struct UnknownVariant {
    /// Human-readable name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `as_str`, `Display`, `FromStr` and `ALL` from one variant table.
macro_rules! wire_names {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire/database name of this variant.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl ::core::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

// =============================================================================
// Catalog
// =============================================================================

/// How often a hosting plan is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "billing_cycle", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

wire_names!(BillingCycle, "billing cycle", {
    Monthly => "monthly",
    Yearly => "yearly",
});

/// Product line a hosting plan belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "plan_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PlanCategory {
    Web,
    Wordpress,
    Woocommerce,
    Email,
}

wire_names!(PlanCategory, "plan category", {
    Web => "web",
    Wordpress => "wordpress",
    Woocommerce => "woocommerce",
    Email => "email",
});

/// How a comparison-table cell is rendered.
///
/// `Text` shows the value; `Check` and `Times` show an icon and carry no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "spec_icon", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SpecIcon {
    #[default]
    Text,
    Check,
    Times,
}

wire_names!(SpecIcon, "spec icon", {
    Text => "text",
    Check => "check",
    Times => "times",
});

// =============================================================================
// Commerce
// =============================================================================

/// Lifecycle of an order.
///
/// Orders start `Pending`; only the payment provider's callback moves them to
/// one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Canceled,
}

wire_names!(OrderStatus, "order status", {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Canceled => "canceled",
});

impl OrderStatus {
    /// Whether no further transitions are allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid | Self::Failed | Self::Canceled)
        )
    }

    /// The payment status that accompanies this order status.
    #[must_use]
    pub const fn payment_status(self) -> PaymentStatus {
        match self {
            Self::Pending => PaymentStatus::Pending,
            Self::Paid => PaymentStatus::Succeeded,
            Self::Failed => PaymentStatus::Failed,
            Self::Canceled => PaymentStatus::Canceled,
        }
    }
}

/// Status of the payment attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Succeeded,
    Failed,
    Canceled,
}

wire_names!(PaymentStatus, "payment status", {
    Pending => "pending",
    Succeeded => "succeeded",
    Failed => "failed",
    Canceled => "canceled",
});

/// What a checkout line item sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "line_item_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum LineItemType {
    Plan,
    Domain,
}

wire_names!(LineItemType, "item type", {
    Plan => "plan",
    Domain => "domain",
});

// =============================================================================
// Site builder
// =============================================================================

/// Section type of a site-builder block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "section_key", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Hero,
    Features,
    Gallery,
    Pricing,
    Faq,
    Cta,
}

wire_names!(SectionKey, "section key", {
    Hero => "hero",
    Features => "features",
    Gallery => "gallery",
    Pricing => "pricing",
    Faq => "faq",
    Cta => "cta",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip_through_from_str() {
        for key in SectionKey::ALL {
            assert_eq!(key.as_str().parse::<SectionKey>().ok(), Some(*key));
        }
        for category in PlanCategory::ALL {
            assert_eq!(category.to_string().parse::<PlanCategory>().ok(), Some(*category));
        }
    }

    #[test]
    fn test_unknown_variant_is_rejected() {
        let err = "banner".parse::<SectionKey>().unwrap_err();
        assert_eq!(err.kind, "section key");
        assert_eq!(err.value, "banner");
        // Matching is exact: wire names are lower-case.
        assert!("Hero".parse::<SectionKey>().is_err());
    }

    #[test]
    fn test_order_status_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Failed));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Canceled));

        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Canceled));
        assert!(!OrderStatus::Failed.can_transition_to(OrderStatus::Paid));
        assert!(!OrderStatus::Canceled.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Paid.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
    }

    #[test]
    fn test_payment_status_follows_order_status() {
        assert_eq!(OrderStatus::Paid.payment_status(), PaymentStatus::Succeeded);
        assert_eq!(OrderStatus::Canceled.payment_status(), PaymentStatus::Canceled);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&LineItemType::Domain).unwrap_or_default(),
            "\"domain\""
        );
        assert_eq!(
            serde_json::from_str::<BillingCycle>("\"yearly\"").ok(),
            Some(BillingCycle::Yearly)
        );
    }
}
