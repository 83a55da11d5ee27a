//! Business logic services for the API.
//!
//! # Services
//!
//! - `token` - Bearer token (HS256 JWT) verification
//! - `catalog` - Cached reads of the plan catalog
//! - `checkout` - Cart validation, order creation and payment hand-off
//! - `domains` - Query parsing for registrar lookups

pub mod catalog;
pub mod checkout;
pub mod domains;
pub mod token;

pub use catalog::PlanCatalog;
pub use token::{TokenError, TokenIdentity, TokenVerifier};
