//! Hostdeck Core - Shared types library.
//!
//! This crate provides common types used across all Hostdeck components:
//! - `api` - JSON REST backend (catalog, checkout, domains, site builder)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation logic - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, domains, slugs and statuses
//! - [`cart`] - Checkout line items and the order total invariant
//! - [`builder`] - Site-builder block descriptors and sync planning

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod builder;
pub mod cart;
pub mod types;

pub use types::*;
