//! Core types for Hostdeck.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod customer;
pub mod domain;
pub mod id;
pub mod price;
pub mod slug;
pub mod status;

pub use customer::{CustomerRef, CustomerRefError};
pub use domain::{search_term, DomainError, DomainName, TldList};
pub use id::*;
pub use price::{CurrencyCode, CurrencyError};
pub use slug::{Slug, SlugError};
pub use status::*;
