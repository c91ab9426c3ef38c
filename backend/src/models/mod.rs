//! Backend model re-exports
//!
//! Domain models live in the `shared` crate so the pure calculation
//! functions and the service layer agree on one representation.

pub use shared::models::*;
pub use shared::types::*;
