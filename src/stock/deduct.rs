// Atomic stock deduction
//
// Applies every decrement for one order inside a single transaction. Each
// decrement is a conditional update guarded by `current_stock >= required`,
// so a stale availability check can never drive stock negative: two
// concurrent orders racing over the same ingredient serialize on the row,
// and the loser's whole order rolls back with a fresh shortage report.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::Ingredient;
use crate::stock::error::{StockError, StockResult};
use crate::stock::types::{DeductedItem, RequirementMap, ShortageDetail, ShortageReason};

/// Applies aggregated requirements to the ingredients table as a single
/// all-or-nothing batch
#[derive(Clone)]
pub struct AtomicDeductor {
    pool: PgPool,
}

impl AtomicDeductor {
    /// Create a new AtomicDeductor
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Decrement stock for every ingredient in the requirement map
    ///
    /// Either every ingredient is decremented or none are. On failure the
    /// returned `InsufficientStock` lists every ingredient that could not
    /// cover its requirement, not just the first one, so the caller can
    /// render a complete shortage panel.
    pub async fn deduct(&self, requirements: &RequirementMap) -> StockResult<Vec<DeductedItem>> {
        if requirements.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut deducted = Vec::with_capacity(requirements.len());
        let mut shortages = Vec::new();

        for (ingredient_id, requirement) in requirements {
            let updated = sqlx::query_as::<_, Ingredient>(
                r#"
                UPDATE ingredients
                SET current_stock = current_stock - $1, updated_at = NOW()
                WHERE id = $2 AND current_stock >= $1
                RETURNING id, name, unit, current_stock, min_threshold, created_at, updated_at
                "#,
            )
            .bind(requirement.total_quantity)
            .bind(ingredient_id)
            .fetch_optional(&mut *tx)
            .await?;

            match updated {
                Some(ingredient) => {
                    if ingredient.is_low_stock() {
                        tracing::warn!(
                            "Ingredient '{}' at {} {} after deduction, threshold {}",
                            ingredient.name,
                            ingredient.current_stock,
                            ingredient.unit,
                            ingredient.min_threshold
                        );
                    }

                    deducted.push(DeductedItem {
                        ingredient_id: ingredient.id,
                        name: ingredient.name,
                        deducted: requirement.total_quantity,
                        remaining: ingredient.current_stock,
                        unit: ingredient.unit,
                    });
                }
                None => {
                    // Guard refused the decrement; read within the same
                    // transaction to tell a missing row from short stock
                    let current: Option<(String, Decimal, String)> = sqlx::query_as(
                        "SELECT name, current_stock, unit FROM ingredients WHERE id = $1",
                    )
                    .bind(ingredient_id)
                    .fetch_optional(&mut *tx)
                    .await?;

                    let shortage = match current {
                        Some((name, available, unit)) => ShortageDetail {
                            ingredient_id: *ingredient_id,
                            name,
                            required: requirement.total_quantity,
                            available,
                            unit,
                            reason: ShortageReason::InsufficientStock,
                        },
                        None => ShortageDetail {
                            ingredient_id: *ingredient_id,
                            name: requirement.ingredient_name.clone(),
                            required: requirement.total_quantity,
                            available: Decimal::ZERO,
                            unit: requirement.unit.clone(),
                            reason: ShortageReason::IngredientNotFound,
                        },
                    };
                    shortages.push(shortage);
                }
            }
        }

        if !shortages.is_empty() {
            // Roll back any decrements already applied in this batch
            tx.rollback().await?;
            tracing::info!(
                "Deduction rolled back, {} ingredient(s) short",
                shortages.len()
            );
            return Err(StockError::InsufficientStock(shortages));
        }

        tx.commit().await?;
        Ok(deducted)
    }
}
