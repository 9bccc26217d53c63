use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// One line of a cart snapshot, passed explicitly into every engine call
///
/// `menu_item_id` is the stable identifier every caller should send. A line
/// may carry only `name`, in which case the resolver falls back to a legacy
/// name lookup and flags the line as a data-quality gap.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CartLine {
    #[schema(example = 12)]
    pub menu_item_id: Option<i32>,
    #[validate(length(min = 1))]
    #[schema(example = "Double Cheeseburger")]
    pub name: String,
    #[validate(range(min = 1))]
    #[schema(example = 3)]
    pub quantity: i32,
    /// Price snapshot in cents, denormalized into the audit record
    #[schema(example = 1250)]
    pub price: i32,
}

/// Policy for cart lines that have no recipe mapping
///
/// The source application silently treated unmapped items as unlimited.
/// That behavior is kept as the `Warn` default but made configurable so the
/// migration gap stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictMode {
    /// An unmapped line blocks the whole operation
    Fail,
    /// Unmapped lines are skipped and reported as warnings
    Warn,
    /// Unmapped lines are skipped silently
    Ignore,
}

impl Default for StrictMode {
    fn default() -> Self {
        StrictMode::Warn
    }
}

impl FromStr for StrictMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(StrictMode::Fail),
            "warn" => Ok(StrictMode::Warn),
            "ignore" => Ok(StrictMode::Ignore),
            _ => Err(format!("Invalid strict mode: {}", s)),
        }
    }
}

/// Total requirement for one ingredient across an entire cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Requirement {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub total_quantity: Decimal,
    pub unit: String,
}

/// Aggregated requirements keyed by ingredient id
///
/// A BTreeMap keeps iteration order deterministic, which in turn keeps the
/// decrement order inside the deduction transaction stable across orders.
pub type RequirementMap = BTreeMap<Uuid, Requirement>;

/// Why an ingredient appears in the shortage list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShortageReason {
    /// Live stock is below the aggregate requirement
    InsufficientStock,
    /// The recipe references an ingredient that no longer exists; treated
    /// as unfulfillable rather than unlimited
    IngredientNotFound,
}

/// One short ingredient, with the numbers the UI needs to render a precise
/// message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShortageDetail {
    pub ingredient_id: Uuid,
    pub name: String,
    pub required: Decimal,
    pub available: Decimal,
    pub unit: String,
    pub reason: ShortageReason,
}

impl ShortageDetail {
    /// How much is missing
    pub fn shortfall(&self) -> Decimal {
        self.required - self.available
    }
}

/// Non-fatal findings collected while processing a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockWarning {
    /// Cart line has no recipe mapping; treated as untracked, assume available
    UnmappedItem { name: String },
    /// Cart line was resolved by name because it carried no stable id
    LegacyNameLookup { name: String },
    /// The history append failed after a successful deduction
    AuditLogFailed { detail: String },
}

/// Result of a pre-checkout availability check; has no side effects on stock
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityReport {
    pub can_fulfill: bool,
    pub shortages: Vec<ShortageDetail>,
    pub warnings: Vec<StockWarning>,
}

/// One ingredient decrement applied by a successful deduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeductedItem {
    pub ingredient_id: Uuid,
    pub name: String,
    pub deducted: Decimal,
    pub remaining: Decimal,
    pub unit: String,
}

/// Result of a successful deduction
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeductionOutcome {
    pub deducted_items: Vec<DeductedItem>,
    /// Id of the appended history record; None when the best-effort audit
    /// write failed (see warnings)
    pub history_id: Option<Uuid>,
    pub warnings: Vec<StockWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_strict_mode_parsing() {
        assert_eq!("fail".parse::<StrictMode>().unwrap(), StrictMode::Fail);
        assert_eq!("WARN".parse::<StrictMode>().unwrap(), StrictMode::Warn);
        assert_eq!("Ignore".parse::<StrictMode>().unwrap(), StrictMode::Ignore);
        assert!("strict".parse::<StrictMode>().is_err());
    }

    #[test]
    fn test_strict_mode_default_is_warn() {
        assert_eq!(StrictMode::default(), StrictMode::Warn);
    }

    #[test]
    fn test_cart_line_quantity_validation() {
        let valid = CartLine {
            menu_item_id: Some(1),
            name: "Burger".to_string(),
            quantity: 1,
            price: 900,
        };
        assert!(valid.validate().is_ok());

        let zero_qty = CartLine { quantity: 0, ..valid.clone() };
        assert!(zero_qty.validate().is_err());

        let unnamed = CartLine { name: String::new(), ..valid };
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn test_shortage_shortfall() {
        let shortage = ShortageDetail {
            ingredient_id: Uuid::new_v4(),
            name: "Bun".to_string(),
            required: dec!(20),
            available: dec!(5),
            unit: "pieces".to_string(),
            reason: ShortageReason::InsufficientStock,
        };

        assert_eq!(shortage.shortfall(), dec!(15));
    }

    #[test]
    fn test_warning_serialization_is_tagged() {
        let warning = StockWarning::UnmappedItem {
            name: "Mystery Special".to_string(),
        };

        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "unmapped_item");
        assert_eq!(json["name"], "Mystery Special");
    }
}
