// Error types for the stock engine
// Non-fatal findings are StockWarning values, not errors; this enum covers
// the conditions that abort an operation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::stock::types::ShortageDetail;

/// Main error type for stock operations
#[derive(Debug, Error)]
pub enum StockError {
    /// A cart line carried an invalid quantity
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// A cart line has no recipe mapping and the engine runs in fail mode
    #[error("No recipe mapping for menu item: {0}")]
    UnmappedItem(String),

    /// One or more ingredients cannot cover the aggregate requirement.
    /// Carries the full structured shortage list for the UI.
    #[error("Insufficient stock for {} ingredient(s)", .0.len())]
    InsufficientStock(Vec<ShortageDetail>),

    /// Underlying read/write failed; propagated to the caller unmodified.
    /// Retry policy is the caller's responsibility.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Serialization of an audit payload failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for stock operations
pub type StockResult<T> = Result<T, StockError>;

impl IntoResponse for StockError {
    fn into_response(self) -> Response {
        match self {
            StockError::InsufficientStock(shortages) => {
                // Structured panel data: each short ingredient with
                // needed/available/shortfall
                let body = Json(json!({
                    "error": "Insufficient stock",
                    "shortages": shortages,
                }));
                (StatusCode::CONFLICT, body).into_response()
            }
            StockError::InvalidQuantity(msg) => {
                let body = Json(json!({ "error": msg }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            StockError::UnmappedItem(name) => {
                let body = Json(json!({
                    "error": format!("No recipe mapping for menu item: {}", name),
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            StockError::DatabaseError(ref e) => {
                tracing::error!("Database error: {}", e);
                let body = Json(json!({ "error": "Database error" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
            StockError::JsonError(ref e) => {
                tracing::error!("JSON error: {}", e);
                let body = Json(json!({ "error": "Internal error" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::types::ShortageReason;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_error_display() {
        let error = StockError::InvalidQuantity("quantity must be positive, got 0".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid quantity: quantity must be positive, got 0"
        );

        let error = StockError::UnmappedItem("Mystery Special".to_string());
        assert_eq!(
            error.to_string(),
            "No recipe mapping for menu item: Mystery Special"
        );
    }

    #[test]
    fn test_insufficient_stock_counts_shortages() {
        let shortages = vec![
            ShortageDetail {
                ingredient_id: Uuid::new_v4(),
                name: "Bun".to_string(),
                required: dec!(20),
                available: dec!(5),
                unit: "pieces".to_string(),
                reason: ShortageReason::InsufficientStock,
            },
            ShortageDetail {
                ingredient_id: Uuid::new_v4(),
                name: "Cheddar".to_string(),
                required: dec!(2),
                available: dec!(0.5),
                unit: "kg".to_string(),
                reason: ShortageReason::InsufficientStock,
            },
        ];

        let error = StockError::InsufficientStock(shortages);
        assert_eq!(error.to_string(), "Insufficient stock for 2 ingredient(s)");
    }

    #[test]
    fn test_error_from_sqlx() {
        let sqlx_error = sqlx::Error::RowNotFound;
        let stock_error: StockError = sqlx_error.into();
        assert!(matches!(stock_error, StockError::DatabaseError(_)));
    }
}
