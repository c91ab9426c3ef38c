//! Business logic services

pub mod catalog;
pub mod costing;
pub mod formulation;
pub mod inventory;
pub mod packaging;
pub mod production;
pub mod sales;

pub use catalog::CatalogService;
pub use costing::CostingService;
pub use formulation::FormulationService;
pub use inventory::InventoryService;
pub use packaging::PackagingService;
pub use production::ProductionService;
pub use sales::SalesService;
