//! Domain models for the Manufacturing ERP

mod customer;
mod formulation;
mod inventory;
mod material;
mod product;
mod production;
mod sale;

pub use customer::*;
pub use formulation::*;
pub use inventory::*;
pub use material::*;
pub use product::*;
pub use production::*;
pub use sale::*;
