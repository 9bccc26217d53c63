use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_quantity_positive, validate_stock_non_negative, validate_unit};

/// Represents one raw-stock unit tracked by the kitchen
///
/// Stock is mutated in exactly two places: admin edits through the
/// ingredients CRUD, and the atomic deductor during order fulfilment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Ingredient {
    pub id: Uuid,
    #[schema(example = "Burger Bun")]
    pub name: String,
    /// Unit of measure (pieces, kg, grams, liters, ml)
    #[schema(example = "pieces")]
    pub unit: String,
    /// Quantity on hand, canonical field name
    #[schema(example = 50)]
    pub current_stock: Decimal,
    /// Stock at or below this level is flagged as low stock
    #[schema(example = 10)]
    pub min_threshold: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    /// Whether this ingredient is at or below its alert threshold
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_threshold
    }
}

/// Payload for creating an ingredient
///
/// Accepts the legacy `stock` field name as an alias for `current_stock`;
/// the alias is normalized here and never reaches core logic or the schema.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateIngredient {
    #[validate(length(min = 1, max = 120))]
    #[schema(example = "Burger Bun")]
    pub name: String,
    #[validate(custom = "validate_unit")]
    #[schema(example = "pieces")]
    pub unit: String,
    #[serde(alias = "stock")]
    #[validate(custom = "validate_stock_non_negative")]
    #[schema(example = 50)]
    pub current_stock: Decimal,
    #[validate(custom = "validate_stock_non_negative")]
    #[schema(example = 10)]
    pub min_threshold: Decimal,
}

/// Payload for updating an ingredient; all fields optional for partial updates
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateIngredient {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(custom = "validate_unit")]
    pub unit: Option<String>,
    #[serde(alias = "stock")]
    #[validate(custom = "validate_stock_non_negative")]
    pub current_stock: Option<Decimal>,
    #[validate(custom = "validate_stock_non_negative")]
    pub min_threshold: Option<Decimal>,
}

/// A menu item as the stock engine sees it: an id, a name for legacy
/// lookups, and a recipe
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MenuItem {
    pub id: i32,
    #[schema(example = "Double Cheeseburger")]
    pub name: String,
    /// Price in cents
    #[schema(example = 1250)]
    pub price: i32,
}

/// One line of a menu item's recipe: the quantity of a single ingredient
/// consumed per one unit of the item
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate, ToSchema)]
pub struct RecipeEntry {
    pub ingredient_id: Uuid,
    /// Denormalized cache of the ingredient name at recipe-authoring time
    #[schema(example = "Burger Bun")]
    pub ingredient_name: String,
    #[validate(custom = "validate_quantity_positive")]
    #[schema(example = 2)]
    pub quantity: Decimal,
    #[schema(example = "pieces")]
    pub unit: String,
}
