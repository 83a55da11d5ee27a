//! Database row types and their JSON views.
//!
//! Row structs derive `sqlx::FromRow` and are read with runtime
//! `query_as`. Where the stored shape and the API shape differ, a separate
//! view type does the conversion.

pub mod account;
pub mod builder;
pub mod order;
pub mod plan;

pub use account::Account;
pub use builder::{Block, Page, Project};
pub use order::{Order, OrderItem, OrderView, Payment};
pub use plan::{HostingPlan, PlanSpec, PlanView, PlanWithSpecs};
