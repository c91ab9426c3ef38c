//! Shared domain types and pure calculations for the Manufacturing ERP
//!
//! This crate contains everything the transaction engine computes without
//! touching I/O: domain models, the unit-conversion calculus, formulation
//! scaling, recursive cost resolution, and validation helpers. The backend
//! wraps these in database transactions.

pub mod costing;
pub mod models;
pub mod types;
pub mod units;
pub mod validation;

pub use costing::*;
pub use models::*;
pub use types::*;
pub use units::*;
pub use validation::*;
