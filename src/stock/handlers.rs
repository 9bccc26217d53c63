// HTTP handlers for stock endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::stock::{
    AvailabilityReport, CartLine, DeductionOutcome, StockError, StockHistoryRecord,
};

/// Request body shared by the check and deduct endpoints: a cart snapshot
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StockCheckRequest {
    #[validate]
    pub items: Vec<CartLine>,
}

/// Request body for the deduct endpoint
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StockDeductRequest {
    /// Order this deduction belongs to, recorded in the audit trail
    pub order_id: Option<Uuid>,
    #[validate]
    pub items: Vec<CartLine>,
}

/// Query parameters for the history endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// Handler for POST /api/stock/check
/// Pre-checkout validation; reads stock, never mutates it
pub async fn check_stock_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<StockCheckRequest>,
) -> Result<Json<AvailabilityReport>, StockError> {
    if request.items.is_empty() {
        return Err(StockError::InvalidQuantity(
            "Cart must contain at least one item".to_string(),
        ));
    }
    request
        .validate()
        .map_err(|e| StockError::InvalidQuantity(e.to_string()))?;

    let report = state.stock.check_stock_availability(&request.items).await?;

    Ok(Json(report))
}

/// Handler for POST /api/stock/deduct
/// Applies the deduction for a confirmed order; called after payment succeeds
pub async fn deduct_stock_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<StockDeductRequest>,
) -> Result<(StatusCode, Json<DeductionOutcome>), StockError> {
    if request.items.is_empty() {
        return Err(StockError::InvalidQuantity(
            "Cart must contain at least one item".to_string(),
        ));
    }
    request
        .validate()
        .map_err(|e| StockError::InvalidQuantity(e.to_string()))?;

    let outcome = state
        .stock
        .deduct_for_order(request.order_id, &request.items)
        .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Handler for GET /api/stock/history
/// Recent deduction audit records, newest first
pub async fn stock_history_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<StockHistoryRecord>>, StockError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);

    let records = state.stock.history().recent(limit).await?;

    Ok(Json(records))
}
