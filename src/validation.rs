// Validation utilities module
// Custom validation functions for stock-domain rules

use rust_decimal::Decimal;
use validator::ValidationError;

/// Validates a unit-of-measure string
///
/// Units are free-form in the source data, so this only rejects empty or
/// unreasonably long strings rather than enforcing a closed list.
pub fn validate_unit(unit: &str) -> Result<(), ValidationError> {
    let trimmed = unit.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("unit_must_not_be_empty"));
    }
    if trimmed.len() > 32 {
        return Err(ValidationError::new("unit_too_long"));
    }
    Ok(())
}

/// Validates that a recipe quantity is strictly positive
pub fn validate_quantity_positive(quantity: &Decimal) -> Result<(), ValidationError> {
    if *quantity <= Decimal::ZERO {
        Err(ValidationError::new("quantity_must_be_positive"))
    } else {
        Ok(())
    }
}

/// Validates that a stock level is non-negative
pub fn validate_stock_non_negative(stock: &Decimal) -> Result<(), ValidationError> {
    if *stock < Decimal::ZERO {
        Err(ValidationError::new("stock_must_not_be_negative"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_unit_accepts_common_units() {
        for unit in ["pieces", "kg", "grams", "liters", "ml"] {
            assert!(validate_unit(unit).is_ok(), "unit '{}' should be valid", unit);
        }
    }

    #[test]
    fn test_validate_unit_rejects_empty() {
        assert!(validate_unit("").is_err());
        assert!(validate_unit("   ").is_err());
    }

    #[test]
    fn test_validate_unit_rejects_overlong() {
        let long = "x".repeat(33);
        assert!(validate_unit(&long).is_err());
    }

    #[test]
    fn test_validate_quantity_positive() {
        assert!(validate_quantity_positive(&dec!(0.001)).is_ok());
        assert!(validate_quantity_positive(&dec!(0)).is_err());
        assert!(validate_quantity_positive(&dec!(-1)).is_err());
    }

    #[test]
    fn test_validate_stock_non_negative() {
        assert!(validate_stock_non_negative(&dec!(0)).is_ok());
        assert!(validate_stock_non_negative(&dec!(5)).is_ok());
        assert!(validate_stock_non_negative(&dec!(-0.1)).is_err());
    }
}
