use crate::error::ApiError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Creates and configures a PostgreSQL connection pool
///
/// # Arguments
/// * `database_url` - PostgreSQL connection string
///
/// # Returns
/// * `Result<DbPool>` - Configured connection pool or error
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Check if an ingredient with the given name already exists
///
/// Ingredient names are the kitchen's working vocabulary, so duplicates are
/// rejected at creation time rather than silently allowed.
pub async fn check_duplicate_ingredient(pool: &PgPool, name: &str) -> Result<bool, ApiError> {
    tracing::debug!("Checking for duplicate ingredient: {}", name);

    let exists: Option<bool> =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM ingredients WHERE name = $1)")
            .bind(name)
            .fetch_one(pool)
            .await?;

    let is_duplicate = exists.unwrap_or(false);
    if is_duplicate {
        tracing::debug!("Duplicate ingredient found: {}", name);
    }

    Ok(is_duplicate)
}

/// Check if an ingredient with the given name already exists, excluding a
/// specific ID. Used for update operations to allow keeping the same name.
pub async fn check_duplicate_ingredient_excluding_id(
    pool: &PgPool,
    name: &str,
    exclude_id: Uuid,
) -> Result<bool, ApiError> {
    let exists: Option<bool> = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM ingredients WHERE name = $1 AND id != $2)",
    )
    .bind(name)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;

    Ok(exists.unwrap_or(false))
}

/// Check whether an ingredient is referenced by any recipe
///
/// The source application never enforced this, which left dangling
/// ingredient references behind. Deletion is blocked here while a recipe
/// still points at the ingredient.
pub async fn ingredient_in_use(pool: &PgPool, ingredient_id: Uuid) -> Result<bool, ApiError> {
    let exists: Option<bool> = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM recipe_entries WHERE ingredient_id = $1)",
    )
    .bind(ingredient_id)
    .fetch_one(pool)
    .await?;

    Ok(exists.unwrap_or(false))
}
