// Stock history logger
//
// Appends one record per successful deduction to the append-only
// stock_history table. Strictly best-effort: a failed append is logged and
// surfaced as a warning, but never rolls back or fails the deduction that
// produced it.

use chrono::{DateTime, Utc};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use uuid::Uuid;

use crate::stock::error::StockResult;
use crate::stock::types::{CartLine, DeductedItem, StockWarning};

/// Records deduction events to the stock history trail
#[derive(Clone)]
pub struct StockHistoryLogger {
    pool: PgPool,
}

impl StockHistoryLogger {
    /// Create a new StockHistoryLogger
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a deduction record
    ///
    /// Returns the new record's id, or `None` when the append failed. The
    /// caller converts `None` into a `StockWarning::AuditLogFailed` so the
    /// failure is visible in the response, not just in the logs.
    pub async fn log_deduction(
        &self,
        order_id: Option<Uuid>,
        deducted: &[DeductedItem],
        cart: &[CartLine],
        warnings: &[StockWarning],
    ) -> Option<Uuid> {
        let items = match serde_json::to_value(deducted) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to serialize deducted items for audit: {}", e);
                return None;
            }
        };
        let cart_items = cart_summary(cart);
        let warning_values = serde_json::to_value(warnings).unwrap_or_else(|_| json!([]));

        match self
            .insert_record(order_id, items, cart_items, warning_values)
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Failed to append stock history record: {}", e);
                None
            }
        }
    }

    async fn insert_record(
        &self,
        order_id: Option<Uuid>,
        items: JsonValue,
        cart_items: JsonValue,
        warnings: JsonValue,
    ) -> Result<Uuid, sqlx::Error> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO stock_history (event_type, source, order_id, items, cart_items, warnings)
            VALUES ('deduction', 'order', $1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(order_id)
        .bind(items)
        .bind(cart_items)
        .bind(warnings)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Fetch the most recent history records, newest first
    pub async fn recent(&self, limit: i64) -> StockResult<Vec<StockHistoryRecord>> {
        let records = sqlx::query_as::<_, StockHistoryRecord>(
            r#"
            SELECT id, event_type, source, order_id, items, cart_items, warnings, created_at
            FROM stock_history
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

/// Denormalized cart lines for traceability: what the customer ordered when
/// this deduction happened, independent of later menu edits
fn cart_summary(cart: &[CartLine]) -> JsonValue {
    JsonValue::Array(
        cart.iter()
            .map(|line| {
                json!({
                    "menu_item_id": line.menu_item_id,
                    "name": line.name,
                    "quantity": line.quantity,
                    "price": line.price,
                })
            })
            .collect(),
    )
}

/// Stock history record as read back from the database
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct StockHistoryRecord {
    pub id: Uuid,
    pub event_type: String,
    pub source: String,
    pub order_id: Option<Uuid>,
    pub items: JsonValue,
    pub cart_items: JsonValue,
    pub warnings: JsonValue,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cart_summary_shape() {
        let cart = vec![
            CartLine {
                menu_item_id: Some(3),
                name: "Double Cheeseburger".to_string(),
                quantity: 2,
                price: 1250,
            },
            CartLine {
                menu_item_id: None,
                name: "Legacy Wrap".to_string(),
                quantity: 1,
                price: 800,
            },
        ];

        let summary = cart_summary(&cart);
        let lines = summary.as_array().unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["menu_item_id"], 3);
        assert_eq!(lines[0]["quantity"], 2);
        assert_eq!(lines[1]["menu_item_id"], JsonValue::Null);
        assert_eq!(lines[1]["name"], "Legacy Wrap");
    }

    #[test]
    fn test_deducted_items_serialize_for_audit() {
        let deducted = vec![DeductedItem {
            ingredient_id: Uuid::new_v4(),
            name: "Bun".to_string(),
            deducted: dec!(20),
            remaining: dec!(30),
            unit: "pieces".to_string(),
        }];

        let value = serde_json::to_value(&deducted).unwrap();

        assert!(value.is_array());
        assert_eq!(value[0]["name"], "Bun");
        assert_eq!(value[0]["deducted"], "20");
        assert_eq!(value[0]["remaining"], "30");
    }

    #[test]
    fn test_warnings_serialize_for_audit() {
        let warnings = vec![StockWarning::UnmappedItem {
            name: "Mystery Special".to_string(),
        }];

        let value = serde_json::to_value(&warnings).unwrap();

        assert_eq!(value[0]["kind"], "unmapped_item");
    }

    #[test]
    fn test_history_record_serialization() {
        let record = StockHistoryRecord {
            id: Uuid::new_v4(),
            event_type: "deduction".to_string(),
            source: "order".to_string(),
            order_id: None,
            items: json!([]),
            cart_items: json!([]),
            warnings: json!([]),
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["event_type"], "deduction");
        assert_eq!(value["source"], "order");
    }
}
