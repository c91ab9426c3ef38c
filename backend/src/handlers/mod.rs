//! HTTP request handlers

pub mod catalog;
pub mod formulation;
pub mod health;
pub mod inventory;
pub mod packaging;
pub mod production;
pub mod sale;

pub use catalog::*;
pub use formulation::*;
pub use health::*;
pub use inventory::*;
pub use packaging::*;
pub use production::*;
pub use sale::*;
