//! Validation utilities for the Manufacturing ERP
//!
//! Pure checks shared by the admin surface and the transaction engine.

use rust_decimal::Decimal;

use crate::types::DiscountType;

/// Validate a human-readable entity name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name must not be empty");
    }
    if trimmed.len() > 200 {
        return Err("Name must be at most 200 characters");
    }
    Ok(())
}

/// Validate a unit string (free text, but must not be blank)
pub fn validate_unit(unit: &str) -> Result<(), &'static str> {
    if unit.trim().is_empty() {
        return Err("Unit must not be empty");
    }
    Ok(())
}

/// Validate a quantity that must be strictly positive
pub fn validate_positive_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a money amount that must not be negative
pub fn validate_non_negative_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount must not be negative");
    }
    Ok(())
}

/// Validate a formulation batch size (the reference scale ingredients were
/// authored at; scaling divides by it)
pub fn validate_batch_size(batch_size: Decimal) -> Result<(), &'static str> {
    if batch_size <= Decimal::ZERO {
        return Err("Batch size must be positive");
    }
    Ok(())
}

/// Validate a discount value against its type
pub fn validate_discount(discount_type: DiscountType, value: Decimal) -> Result<(), &'static str> {
    match discount_type {
        DiscountType::None => Ok(()),
        DiscountType::Percentage => {
            if value < Decimal::ZERO || value > Decimal::from(100) {
                Err("Percentage discount must be between 0 and 100")
            } else {
                Ok(())
            }
        }
        DiscountType::Fixed => {
            if value < Decimal::ZERO {
                Err("Fixed discount must not be negative")
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules() {
        assert!(validate_name("Cream base").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn discount_rules() {
        assert!(validate_discount(DiscountType::Percentage, Decimal::from(50)).is_ok());
        assert!(validate_discount(DiscountType::Percentage, Decimal::from(101)).is_err());
        assert!(validate_discount(DiscountType::Fixed, Decimal::from(-1)).is_err());
        assert!(validate_discount(DiscountType::None, Decimal::from(-99)).is_ok());
    }
}
