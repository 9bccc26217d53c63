// Stock Engine Module
//
// Ingredient-level stock tracking for order fulfilment. Four stages, leaves
// first:
// - Recipe resolution: map cart lines to menu item ingredient lists
// - Requirement aggregation: consolidate per-ingredient totals across lines
// - Availability checking: compare the aggregate against live stock
// - Atomic deduction: apply all decrements in one transaction, then append
//   a best-effort audit record
//
// The availability check also runs standalone for pre-checkout validation,
// with no side effects on stock.

pub mod aggregate;
pub mod audit;
pub mod availability;
pub mod deduct;
pub mod error;
pub mod handlers;
pub mod recipes;
pub mod types;

// Re-export commonly used types for convenience
pub use aggregate::RequirementAggregator;
pub use audit::{StockHistoryLogger, StockHistoryRecord};
pub use availability::AvailabilityChecker;
pub use deduct::AtomicDeductor;
pub use error::{StockError, StockResult};
pub use recipes::{Recipe, RecipeResolver};
pub use types::{
    AvailabilityReport, CartLine, DeductedItem, DeductionOutcome, Requirement, RequirementMap,
    ShortageDetail, ShortageReason, StockWarning, StrictMode,
};

use sqlx::PgPool;
use uuid::Uuid;

/// Stock Engine - Orchestrator
///
/// Coordinates resolver, aggregator, checker, deductor and audit logger.
/// Holds no cart state of its own; every caller passes the current cart
/// snapshot explicitly.
pub struct StockEngine {
    resolver: RecipeResolver,
    checker: AvailabilityChecker,
    deductor: AtomicDeductor,
    history: StockHistoryLogger,
    strict_mode: StrictMode,
}

impl StockEngine {
    /// Create a new StockEngine over a shared pool
    pub fn new(pool: PgPool, strict_mode: StrictMode) -> Self {
        Self {
            resolver: RecipeResolver::new(pool.clone()),
            checker: AvailabilityChecker::new(pool.clone()),
            deductor: AtomicDeductor::new(pool.clone()),
            history: StockHistoryLogger::new(pool),
            strict_mode,
        }
    }

    /// The configured unmapped-item policy
    pub fn strict_mode(&self) -> StrictMode {
        self.strict_mode
    }

    /// Access the history logger, for the read-back endpoint
    pub fn history(&self) -> &StockHistoryLogger {
        &self.history
    }

    /// Resolve and aggregate a cart into per-ingredient requirements
    async fn aggregate_cart(
        &self,
        cart: &[CartLine],
    ) -> StockResult<(RequirementMap, Vec<StockWarning>)> {
        let (recipes, mut warnings) = self.resolver.resolve_for_cart(cart).await?;
        let (requirements, aggregation_warnings) =
            RequirementAggregator::aggregate(cart, &recipes, self.strict_mode)?;
        warnings.extend(aggregation_warnings);
        Ok((requirements, warnings))
    }

    /// Pre-checkout validation: aggregate and check, never deduct
    ///
    /// A cart where no line has a mapped recipe aggregates to nothing and is
    /// reported as fulfillable; the warnings say why.
    pub async fn check_stock_availability(
        &self,
        cart: &[CartLine],
    ) -> StockResult<AvailabilityReport> {
        let (requirements, warnings) = self.aggregate_cart(cart).await?;
        let mut report = self.checker.check(&requirements).await?;
        report.warnings = warnings;
        Ok(report)
    }

    /// Deduct stock for a confirmed order
    ///
    /// Aggregates, checks availability, then applies the decrements as one
    /// atomic batch. The check is advisory; the deductor's per-row guard is
    /// what actually protects against concurrent orders. After a successful
    /// commit one history record is appended, best-effort.
    pub async fn deduct_for_order(
        &self,
        order_id: Option<Uuid>,
        cart: &[CartLine],
    ) -> StockResult<DeductionOutcome> {
        let (requirements, mut warnings) = self.aggregate_cart(cart).await?;

        if requirements.is_empty() {
            tracing::debug!("No tracked ingredients in cart, nothing to deduct");
            return Ok(DeductionOutcome {
                deducted_items: Vec::new(),
                history_id: None,
                warnings,
            });
        }

        let report = self.checker.check(&requirements).await?;
        if !report.can_fulfill {
            return Err(StockError::InsufficientStock(report.shortages));
        }

        let deducted_items = self.deductor.deduct(&requirements).await?;

        let history_id = self
            .history
            .log_deduction(order_id, &deducted_items, cart, &warnings)
            .await;
        if history_id.is_none() {
            warnings.push(StockWarning::AuditLogFailed {
                detail: "stock history append failed; deduction committed".to_string(),
            });
        }

        tracing::info!(
            "Deducted {} ingredient(s) for order {:?}",
            deducted_items.len(),
            order_id
        );

        Ok(DeductionOutcome {
            deducted_items,
            history_id,
            warnings,
        })
    }
}
