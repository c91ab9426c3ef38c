//! Inventory ledger models and availability math

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::IngredientRequirement;
use crate::types::InventoryKind;

/// Current stock for one inventory-tracked entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub entity_id: Uuid,
    pub kind: InventoryKind,
    pub quantity: Decimal,
    /// Finished goods only: expiry stamped by the latest crediting batch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

/// One short entity inside an InsufficientInventory error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shortage {
    pub entity_id: Uuid,
    pub name: String,
    pub kind: InventoryKind,
    /// Required quantity, in the entity's native unit
    pub required: Decimal,
    pub available: Decimal,
}

/// Check a set of requirements against available stock, collecting every
/// shortage rather than stopping at the first. Quantities must already be
/// in each entity's native unit. Mutates nothing.
pub fn find_shortages(
    requirements: &[(IngredientRequirement, String)],
    available: &HashMap<Uuid, Decimal>,
    kind: InventoryKind,
) -> Vec<Shortage> {
    requirements
        .iter()
        .filter_map(|(req, name)| {
            let stock = available
                .get(&req.ingredient_id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            if stock < req.quantity {
                Some(Shortage {
                    entity_id: req.ingredient_id,
                    name: name.clone(),
                    kind,
                    required: req.quantity,
                    available: stock,
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IngredientType;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn req(id: Uuid, quantity: &str) -> (IngredientRequirement, String) {
        (
            IngredientRequirement {
                ingredient_type: IngredientType::RawMaterial,
                ingredient_id: id,
                quantity: dec(quantity),
                unit: "kg".to_string(),
            },
            "material".to_string(),
        )
    }

    #[test]
    fn collects_all_shortages_not_just_first() {
        let m1 = Uuid::new_v4();
        let m2 = Uuid::new_v4();
        let m3 = Uuid::new_v4();
        let reqs = vec![req(m1, "10"), req(m2, "10"), req(m3, "10")];
        let mut stock = HashMap::new();
        stock.insert(m1, dec("20"));
        stock.insert(m2, dec("5"));
        // m3 has no ledger row at all

        let shortages = find_shortages(&reqs, &stock, InventoryKind::RawMaterial);
        assert_eq!(shortages.len(), 2);
        assert_eq!(shortages[0].entity_id, m2);
        assert_eq!(shortages[0].available, dec("5"));
        assert_eq!(shortages[1].entity_id, m3);
        assert_eq!(shortages[1].available, Decimal::ZERO);
    }

    #[test]
    fn exact_stock_is_sufficient() {
        let m = Uuid::new_v4();
        let mut stock = HashMap::new();
        stock.insert(m, dec("10"));
        let shortages = find_shortages(&[req(m, "10")], &stock, InventoryKind::RawMaterial);
        assert!(shortages.is_empty());
    }
}
