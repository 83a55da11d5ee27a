//! Checkout cart validation and order totals.
//!
//! The client sends line items with integer minor-unit prices. Everything is
//! validated here before anything is written: quantities default to 1,
//! currencies default to the store currency and must match it, and the total
//! is computed with checked `i64` arithmetic. A client-declared total is never
//! trusted.

use serde::{Deserialize, Serialize};

use crate::types::{CurrencyCode, LineItemType};

/// Maximum length for item names and SKUs.
pub const MAX_TEXT_LEN: usize = 255;

/// Errors that can occur when validating a cart.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("items cannot be empty")]
    Empty,

    #[error("item {index}: {field} is required")]
    MissingField { index: usize, field: &'static str },

    #[error("item {index}: {field} exceeds {MAX_TEXT_LEN} characters")]
    TooLong { index: usize, field: &'static str },

    #[error("item {index}: quantity must be between 1 and {}", i32::MAX)]
    InvalidQuantity { index: usize },

    #[error("item {index}: unit_amount_cents cannot be negative")]
    NegativeAmount { index: usize },

    #[error("item {index}: invalid currency {value:?}")]
    InvalidCurrency { index: usize, value: String },

    #[error("item {index}: currency {found} does not match store currency {expected}")]
    CurrencyMismatch {
        index: usize,
        expected: CurrencyCode,
        found: CurrencyCode,
    },

    #[error("order total overflows")]
    Overflow,
}

/// A line item as submitted by the client. All fields are optional so that
/// missing values produce field-specific errors instead of a generic
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartItemInput {
    pub item_type: Option<LineItemType>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub quantity: Option<i64>,
    pub unit_amount_cents: Option<i64>,
    pub currency: Option<String>,
}

/// A validated line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub item_type: LineItemType,
    pub name: String,
    pub sku: String,
    pub quantity: i32,
    pub unit_amount_cents: i64,
    pub currency: CurrencyCode,
}

impl CartItem {
    /// `quantity × unit_amount_cents`, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<i64> {
        self.unit_amount_cents.checked_mul(i64::from(self.quantity))
    }
}

/// A validated cart with its server-computed total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub currency: CurrencyCode,
    pub total_amount_cents: i64,
}

impl Cart {
    /// Validate client line items against the store currency.
    ///
    /// # Errors
    ///
    /// Returns the first [`CartError`] found, in item order.
    pub fn from_inputs(inputs: Vec<CartItemInput>, store_currency: &CurrencyCode) -> Result<Self, CartError> {
        if inputs.is_empty() {
            return Err(CartError::Empty);
        }

        let items = inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| validate_item(index, input, store_currency))
            .collect::<Result<Vec<_>, _>>()?;

        let total_amount_cents = order_total(&items).ok_or(CartError::Overflow)?;

        Ok(Self {
            items,
            currency: store_currency.clone(),
            total_amount_cents,
        })
    }
}

/// Sum of `quantity × unit_amount_cents` over all items.
///
/// Returns `None` if any product or the running sum overflows `i64`.
#[must_use]
pub fn order_total(items: &[CartItem]) -> Option<i64> {
    items
        .iter()
        .try_fold(0i64, |acc, item| acc.checked_add(item.line_total()?))
}

fn required_text(index: usize, field: &'static str, value: Option<String>) -> Result<String, CartError> {
    let value = value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(CartError::MissingField { index, field })?;
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(CartError::TooLong { index, field });
    }
    Ok(value)
}

fn validate_item(index: usize, input: CartItemInput, store_currency: &CurrencyCode) -> Result<CartItem, CartError> {
    let item_type = input.item_type.ok_or(CartError::MissingField {
        index,
        field: "item_type",
    })?;
    let name = required_text(index, "name", input.name)?;
    let sku = required_text(index, "sku", input.sku)?;

    let quantity = input.quantity.unwrap_or(1);
    let quantity = i32::try_from(quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or(CartError::InvalidQuantity { index })?;

    let unit_amount_cents = input.unit_amount_cents.ok_or(CartError::MissingField {
        index,
        field: "unit_amount_cents",
    })?;
    if unit_amount_cents < 0 {
        return Err(CartError::NegativeAmount { index });
    }

    let currency = match input.currency.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(raw) => CurrencyCode::parse(raw).map_err(|_| CartError::InvalidCurrency {
            index,
            value: raw.to_owned(),
        })?,
        None => store_currency.clone(),
    };
    if &currency != store_currency {
        return Err(CartError::CurrencyMismatch {
            index,
            expected: store_currency.clone(),
            found: currency,
        });
    }

    Ok(CartItem {
        item_type,
        name,
        sku,
        quantity,
        unit_amount_cents,
        currency,
    })
}
