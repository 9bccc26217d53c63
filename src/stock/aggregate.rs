// Requirement aggregation
//
// Pure consolidation of a cart snapshot into per-ingredient totals. Works
// entirely on already-resolved recipes so the arithmetic is testable without
// a database; all I/O lives in the resolver and the checker.

use rust_decimal::Decimal;

use crate::stock::error::{StockError, StockResult};
use crate::stock::recipes::Recipe;
use crate::stock::types::{CartLine, Requirement, RequirementMap, StockWarning, StrictMode};

/// Consolidates cart lines into a map of ingredient id to total required
/// quantity
pub struct RequirementAggregator;

impl RequirementAggregator {
    /// Aggregate ingredient requirements across all cart lines
    ///
    /// `recipes` must be parallel to `cart` (one resolver result per line).
    /// Lines with no recipe mapping contribute nothing; depending on the
    /// strict mode they fail the call, produce a warning, or are skipped
    /// silently. An empty result map means the whole cart is untracked and
    /// the caller must treat it as fulfillable.
    pub fn aggregate(
        cart: &[CartLine],
        recipes: &[Option<Recipe>],
        strict_mode: StrictMode,
    ) -> StockResult<(RequirementMap, Vec<StockWarning>)> {
        debug_assert_eq!(cart.len(), recipes.len());

        let mut requirements = RequirementMap::new();
        let mut warnings = Vec::new();

        for (line, recipe) in cart.iter().zip(recipes.iter()) {
            if line.quantity < 1 {
                return Err(StockError::InvalidQuantity(format!(
                    "Quantity must be at least 1, got {} for '{}'",
                    line.quantity, line.name
                )));
            }

            let recipe = match recipe {
                Some(recipe) if !recipe.is_unmapped() => recipe,
                _ => {
                    match strict_mode {
                        StrictMode::Fail => {
                            return Err(StockError::UnmappedItem(line.name.clone()));
                        }
                        StrictMode::Warn => {
                            tracing::debug!("Cart line '{}' has no recipe mapping", line.name);
                            warnings.push(StockWarning::UnmappedItem {
                                name: line.name.clone(),
                            });
                        }
                        StrictMode::Ignore => {}
                    }
                    continue;
                }
            };

            let line_qty = Decimal::from(line.quantity);
            for entry in &recipe.entries {
                let needed = entry.quantity * line_qty;
                requirements
                    .entry(entry.ingredient_id)
                    .and_modify(|req| req.total_quantity += needed)
                    .or_insert_with(|| Requirement {
                        ingredient_id: entry.ingredient_id,
                        ingredient_name: entry.ingredient_name.clone(),
                        total_quantity: needed,
                        unit: entry.unit.clone(),
                    });
            }
        }

        Ok((requirements, warnings))
    }
}
