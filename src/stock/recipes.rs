// Recipe resolution
//
// Maps cart lines to menu item recipes. The stable menu_item_id is the
// primary lookup key; resolution by name survives only as a fallback for
// legacy cart payloads and is reported as a warning when used.

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{MenuItem, RecipeEntry};
use crate::stock::error::StockResult;
use crate::stock::types::{CartLine, StockWarning};

/// A menu item's ingredient requirements, per one unit of the item
#[derive(Debug, Clone)]
pub struct Recipe {
    pub menu_item_id: i32,
    pub name: String,
    pub entries: Vec<RecipeEntry>,
}

impl Recipe {
    /// A recipe with no entries gives the engine nothing to track; such
    /// items fall under the unmapped-item policy
    pub fn is_unmapped(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Row shape for the recipe entries batch query
#[derive(Debug, sqlx::FromRow)]
struct RecipeEntryRow {
    menu_item_id: i32,
    ingredient_id: Uuid,
    ingredient_name: String,
    quantity: Decimal,
    unit: String,
}

/// Repository resolving menu items to their recipes
#[derive(Clone)]
pub struct RecipeResolver {
    pool: PgPool,
}

impl RecipeResolver {
    /// Create a new RecipeResolver
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve each cart line to its recipe
    ///
    /// Returns one entry per cart line, in order; `None` means the menu item
    /// does not exist in the store at all. Warnings record every line that
    /// had to be resolved by name.
    pub async fn resolve_for_cart(
        &self,
        cart: &[CartLine],
    ) -> StockResult<(Vec<Option<Recipe>>, Vec<StockWarning>)> {
        let mut warnings = Vec::new();

        // Batch fetch for lines that carry a stable id
        let ids: Vec<i32> = cart.iter().filter_map(|line| line.menu_item_id).collect();
        let mut items_by_id: HashMap<i32, MenuItem> = if ids.is_empty() {
            HashMap::new()
        } else {
            sqlx::query_as::<_, MenuItem>(
                "SELECT id, name, price FROM menu_items WHERE id = ANY($1)",
            )
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect()
        };

        // Legacy fallback: lines without an id are resolved by name, one
        // round trip each
        let mut id_for_line: Vec<Option<i32>> = Vec::with_capacity(cart.len());
        for line in cart {
            match line.menu_item_id {
                Some(id) => id_for_line.push(items_by_id.contains_key(&id).then_some(id)),
                None => {
                    tracing::warn!("Resolving cart line '{}' by name, no stable id", line.name);
                    warnings.push(StockWarning::LegacyNameLookup {
                        name: line.name.clone(),
                    });

                    let item = sqlx::query_as::<_, MenuItem>(
                        "SELECT id, name, price FROM menu_items WHERE name = $1",
                    )
                    .bind(&line.name)
                    .fetch_optional(&self.pool)
                    .await?;

                    match item {
                        Some(item) => {
                            id_for_line.push(Some(item.id));
                            items_by_id.insert(item.id, item);
                        }
                        None => id_for_line.push(None),
                    }
                }
            }
        }

        // One batch fetch of recipe entries for every resolved item
        let resolved_ids: Vec<i32> = items_by_id.keys().copied().collect();
        let entry_rows: Vec<RecipeEntryRow> = if resolved_ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as::<_, RecipeEntryRow>(
                r#"
                SELECT menu_item_id, ingredient_id, ingredient_name, quantity, unit
                FROM recipe_entries
                WHERE menu_item_id = ANY($1)
                ORDER BY id
                "#,
            )
            .bind(&resolved_ids)
            .fetch_all(&self.pool)
            .await?
        };

        let mut entries_by_item = group_entries(entry_rows);

        let recipes = id_for_line
            .into_iter()
            .map(|maybe_id| {
                maybe_id.map(|id| {
                    let item = &items_by_id[&id];
                    Recipe {
                        menu_item_id: id,
                        name: item.name.clone(),
                        entries: entries_by_item.remove(&id).unwrap_or_default(),
                    }
                })
            })
            .collect();

        Ok((recipes, warnings))
    }
}

/// Group fetched entry rows by menu item id
fn group_entries(rows: Vec<RecipeEntryRow>) -> HashMap<i32, Vec<RecipeEntry>> {
    let mut grouped: HashMap<i32, Vec<RecipeEntry>> = HashMap::new();
    for row in rows {
        grouped.entry(row.menu_item_id).or_default().push(RecipeEntry {
            ingredient_id: row.ingredient_id,
            ingredient_name: row.ingredient_name,
            quantity: row.quantity,
            unit: row.unit,
        });
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // Query paths are covered by DB-backed integration tests; grouping and
    // the unmapped predicate are exercised here.

    #[test]
    fn test_group_entries_by_menu_item() {
        let cheese = Uuid::new_v4();
        let bun = Uuid::new_v4();

        let rows = vec![
            RecipeEntryRow {
                menu_item_id: 1,
                ingredient_id: bun,
                ingredient_name: "Bun".to_string(),
                quantity: dec!(2),
                unit: "pieces".to_string(),
            },
            RecipeEntryRow {
                menu_item_id: 1,
                ingredient_id: cheese,
                ingredient_name: "Cheddar".to_string(),
                quantity: dec!(0.05),
                unit: "kg".to_string(),
            },
            RecipeEntryRow {
                menu_item_id: 2,
                ingredient_id: cheese,
                ingredient_name: "Cheddar".to_string(),
                quantity: dec!(0.1),
                unit: "kg".to_string(),
            },
        ];

        let grouped = group_entries(rows);

        assert_eq!(grouped[&1].len(), 2);
        assert_eq!(grouped[&2].len(), 1);
        assert_eq!(grouped[&2][0].quantity, dec!(0.1));
    }

    #[test]
    fn test_recipe_without_entries_is_unmapped() {
        let recipe = Recipe {
            menu_item_id: 7,
            name: "Plain Water".to_string(),
            entries: vec![],
        };

        assert!(recipe.is_unmapped());
    }
}
