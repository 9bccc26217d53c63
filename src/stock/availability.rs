// Availability checking
//
// Fetches live ingredient stock for an aggregated requirement map and
// evaluates whether every requirement is satisfiable. Performs one batch
// read and no writes; stock is never locked or reserved here, so the result
// is advisory. The deductor re-verifies per ingredient at write time.

use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::Ingredient;
use crate::stock::error::StockResult;
use crate::stock::types::{
    AvailabilityReport, RequirementMap, ShortageDetail, ShortageReason,
};

/// Checks an aggregated requirement map against live ingredient stock
#[derive(Clone)]
pub struct AvailabilityChecker {
    pool: PgPool,
}

impl AvailabilityChecker {
    /// Create a new AvailabilityChecker
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check every requirement against current stock
    ///
    /// Side-effect free; calling it twice without an intervening deduction
    /// returns identical results.
    pub async fn check(&self, requirements: &RequirementMap) -> StockResult<AvailabilityReport> {
        let stocks = self.fetch_ingredients(requirements).await?;
        Ok(evaluate(requirements, &stocks))
    }

    /// One batch read for every distinct ingredient in the aggregate
    async fn fetch_ingredients(
        &self,
        requirements: &RequirementMap,
    ) -> StockResult<HashMap<Uuid, Ingredient>> {
        if requirements.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<Uuid> = requirements.keys().copied().collect();
        let ingredients = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT id, name, unit, current_stock, min_threshold, created_at, updated_at
            FROM ingredients
            WHERE id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(ingredients
            .into_iter()
            .map(|ingredient| (ingredient.id, ingredient))
            .collect())
    }
}

/// Evaluate requirements against a fetched stock snapshot
///
/// A requirement whose ingredient row is missing fails closed: the recipe
/// mapping is stale, but treating the ingredient as unlimited would be
/// worse than blocking the order.
pub fn evaluate(
    requirements: &RequirementMap,
    stocks: &HashMap<Uuid, Ingredient>,
) -> AvailabilityReport {
    let mut shortages = Vec::new();

    for (ingredient_id, requirement) in requirements {
        match stocks.get(ingredient_id) {
            None => {
                shortages.push(ShortageDetail {
                    ingredient_id: *ingredient_id,
                    name: requirement.ingredient_name.clone(),
                    required: requirement.total_quantity,
                    available: rust_decimal::Decimal::ZERO,
                    unit: requirement.unit.clone(),
                    reason: ShortageReason::IngredientNotFound,
                });
            }
            Some(ingredient) if ingredient.current_stock < requirement.total_quantity => {
                shortages.push(ShortageDetail {
                    ingredient_id: *ingredient_id,
                    name: ingredient.name.clone(),
                    required: requirement.total_quantity,
                    available: ingredient.current_stock,
                    unit: ingredient.unit.clone(),
                    reason: ShortageReason::InsufficientStock,
                });
            }
            Some(_) => {}
        }
    }

    AvailabilityReport {
        can_fulfill: shortages.is_empty(),
        shortages,
        warnings: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::types::Requirement;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn ingredient(id: Uuid, name: &str, stock: Decimal) -> Ingredient {
        Ingredient {
            id,
            name: name.to_string(),
            unit: "pieces".to_string(),
            current_stock: stock,
            min_threshold: dec!(5),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn requirement(id: Uuid, name: &str, total: Decimal) -> (Uuid, Requirement) {
        (
            id,
            Requirement {
                ingredient_id: id,
                ingredient_name: name.to_string(),
                total_quantity: total,
                unit: "pieces".to_string(),
            },
        )
    }

    #[test]
    fn test_sufficient_stock_can_fulfill() {
        // Bun at 50, requirement of 2 per item * qty 10 = 20
        let bun = Uuid::new_v4();
        let requirements: RequirementMap =
            [requirement(bun, "Bun", dec!(20))].into_iter().collect();
        let stocks: HashMap<Uuid, Ingredient> =
            [(bun, ingredient(bun, "Bun", dec!(50)))].into_iter().collect();

        let report = evaluate(&requirements, &stocks);

        assert!(report.can_fulfill);
        assert!(report.shortages.is_empty());
    }

    #[test]
    fn test_insufficient_stock_reports_shortage() {
        // Same requirement, Bun at 5
        let bun = Uuid::new_v4();
        let requirements: RequirementMap =
            [requirement(bun, "Bun", dec!(20))].into_iter().collect();
        let stocks: HashMap<Uuid, Ingredient> =
            [(bun, ingredient(bun, "Bun", dec!(5)))].into_iter().collect();

        let report = evaluate(&requirements, &stocks);

        assert!(!report.can_fulfill);
        assert_eq!(report.shortages.len(), 1);

        let shortage = &report.shortages[0];
        assert_eq!(shortage.name, "Bun");
        assert_eq!(shortage.required, dec!(20));
        assert_eq!(shortage.available, dec!(5));
        assert_eq!(shortage.unit, "pieces");
        assert_eq!(shortage.shortfall(), dec!(15));
        assert_eq!(shortage.reason, ShortageReason::InsufficientStock);
    }

    #[test]
    fn test_exact_stock_is_sufficient() {
        let bun = Uuid::new_v4();
        let requirements: RequirementMap =
            [requirement(bun, "Bun", dec!(20))].into_iter().collect();
        let stocks: HashMap<Uuid, Ingredient> =
            [(bun, ingredient(bun, "Bun", dec!(20)))].into_iter().collect();

        let report = evaluate(&requirements, &stocks);

        assert!(report.can_fulfill);
    }

    #[test]
    fn test_missing_ingredient_fails_closed() {
        let ghost = Uuid::new_v4();
        let requirements: RequirementMap =
            [requirement(ghost, "Truffle Oil", dec!(1))].into_iter().collect();
        let stocks = HashMap::new();

        let report = evaluate(&requirements, &stocks);

        assert!(!report.can_fulfill);
        assert_eq!(report.shortages[0].reason, ShortageReason::IngredientNotFound);
        assert_eq!(report.shortages[0].available, Decimal::ZERO);
    }

    #[test]
    fn test_mixed_shortages_list_every_short_ingredient() {
        let bun = Uuid::new_v4();
        let cheese = Uuid::new_v4();
        let lettuce = Uuid::new_v4();
        let requirements: RequirementMap = [
            requirement(bun, "Bun", dec!(20)),
            requirement(cheese, "Cheese", dec!(8)),
            requirement(lettuce, "Lettuce", dec!(4)),
        ]
        .into_iter()
        .collect();
        let stocks: HashMap<Uuid, Ingredient> = [
            (bun, ingredient(bun, "Bun", dec!(50))),
            (cheese, ingredient(cheese, "Cheese", dec!(3))),
            (lettuce, ingredient(lettuce, "Lettuce", dec!(0))),
        ]
        .into_iter()
        .collect();

        let report = evaluate(&requirements, &stocks);

        assert!(!report.can_fulfill);
        assert_eq!(report.shortages.len(), 2);
    }

    #[test]
    fn test_empty_requirements_are_fulfillable() {
        let report = evaluate(&RequirementMap::new(), &HashMap::new());
        assert!(report.can_fulfill);
    }

    #[test]
    fn test_check_is_idempotent_on_snapshot() {
        // Evaluation is pure: the same requirements against the same
        // snapshot always produce the same report
        let bun = Uuid::new_v4();
        let requirements: RequirementMap =
            [requirement(bun, "Bun", dec!(20))].into_iter().collect();
        let stocks: HashMap<Uuid, Ingredient> =
            [(bun, ingredient(bun, "Bun", dec!(5)))].into_iter().collect();

        let first = evaluate(&requirements, &stocks);
        let second = evaluate(&requirements, &stocks);

        assert_eq!(first.can_fulfill, second.can_fulfill);
        assert_eq!(first.shortages, second.shortages);
    }
}
