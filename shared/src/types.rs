//! Common enums used across the platform

use serde::{Deserialize, Serialize};

/// Kind of inventory-tracked entity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InventoryKind {
    RawMaterial,
    BulkProduct,
    FinishedProduct,
}

impl InventoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryKind::RawMaterial => "raw_material",
            InventoryKind::BulkProduct => "bulk_product",
            InventoryKind::FinishedProduct => "finished_product",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "raw_material" => Some(InventoryKind::RawMaterial),
            "bulk_product" => Some(InventoryKind::BulkProduct),
            "finished_product" => Some(InventoryKind::FinishedProduct),
            _ => None,
        }
    }
}

impl std::fmt::Display for InventoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InventoryKind::RawMaterial => write!(f, "raw material"),
            InventoryKind::BulkProduct => write!(f, "bulk product"),
            InventoryKind::FinishedProduct => write!(f, "finished product"),
        }
    }
}

/// What a formulation yields at 1x batch size
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProducesType {
    Bulk,
    Finished,
}

impl ProducesType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProducesType::Bulk => "bulk",
            ProducesType::Finished => "finished",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bulk" => Some(ProducesType::Bulk),
            "finished" => Some(ProducesType::Finished),
            _ => None,
        }
    }
}

/// What a formulation ingredient references
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IngredientType {
    RawMaterial,
    BulkProduct,
}

impl IngredientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientType::RawMaterial => "raw_material",
            IngredientType::BulkProduct => "bulk_product",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "raw_material" => Some(IngredientType::RawMaterial),
            "bulk_product" => Some(IngredientType::BulkProduct),
            _ => None,
        }
    }
}

/// Discount applied to a sale
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    #[default]
    None,
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::None => "none",
            DiscountType::Percentage => "percentage",
            DiscountType::Fixed => "fixed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(DiscountType::None),
            "percentage" => Some(DiscountType::Percentage),
            "fixed" => Some(DiscountType::Fixed),
            _ => None,
        }
    }
}

/// Type of a customer ledger entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    Sale,
    Payment,
}

impl LedgerEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryType::Sale => "sale",
            LedgerEntryType::Payment => "payment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sale" => Some(LedgerEntryType::Sale),
            "payment" => Some(LedgerEntryType::Payment),
            _ => None,
        }
    }
}
