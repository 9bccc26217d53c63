mod db;
mod error;
mod models;
mod stock;
mod validation;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use error::ApiError;
use models::{CreateIngredient, Ingredient, UpdateIngredient};
use stock::{StockEngine, StrictMode};
use validator::Validate;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        create_ingredient,
        get_all_ingredients,
        get_ingredient_by_id,
        update_ingredient,
        delete_ingredient,
    ),
    components(
        schemas(Ingredient, CreateIngredient, UpdateIngredient)
    ),
    tags(
        (name = "ingredients", description = "Ingredient stock management endpoints")
    ),
    info(
        title = "Kitchen Stock API",
        version = "1.0.0",
        description = "Ingredient stock tracking and order deduction backend",
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub stock: Arc<StockEngine>,
}

/// Query parameters for listing ingredients
#[derive(Debug, serde::Deserialize)]
struct IngredientListQuery {
    /// When true, only ingredients at or below their alert threshold
    low_stock: Option<bool>,
}

/// Handler for POST /api/ingredients
/// Creates a new ingredient
#[utoipa::path(
    post,
    path = "/api/ingredients",
    request_body = CreateIngredient,
    responses(
        (status = 201, description = "Ingredient created successfully", body = Ingredient),
        (status = 400, description = "Invalid input data"),
        (status = 409, description = "Ingredient name already exists"),
        (status = 500, description = "Internal server error")
    ),
    tag = "ingredients"
)]
async fn create_ingredient(
    State(state): State<AppState>,
    Json(payload): Json<CreateIngredient>,
) -> Result<(StatusCode, Json<Ingredient>), ApiError> {
    tracing::debug!("Creating new ingredient: {}", payload.name);

    payload.validate()?;

    if db::check_duplicate_ingredient(&state.db, &payload.name).await? {
        tracing::warn!("Attempt to create duplicate ingredient: {}", payload.name);
        return Err(ApiError::Conflict {
            message: format!("Ingredient with name '{}' already exists", payload.name),
        });
    }

    let ingredient = sqlx::query_as::<_, Ingredient>(
        r#"
        INSERT INTO ingredients (name, unit, current_stock, min_threshold)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, unit, current_stock, min_threshold, created_at, updated_at
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.unit)
    .bind(payload.current_stock)
    .bind(payload.min_threshold)
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Successfully created ingredient with id: {}", ingredient.id);
    Ok((StatusCode::CREATED, Json(ingredient)))
}

/// Handler for GET /api/ingredients
/// Lists ingredients, optionally filtered to low stock only
#[utoipa::path(
    get,
    path = "/api/ingredients",
    params(
        ("low_stock" = Option<bool>, Query, description = "Only ingredients at or below their threshold")
    ),
    responses(
        (status = 200, description = "List of ingredients", body = Vec<Ingredient>),
        (status = 500, description = "Internal server error")
    ),
    tag = "ingredients"
)]
async fn get_all_ingredients(
    Query(query): Query<IngredientListQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    tracing::debug!("Fetching ingredients, low_stock={:?}", query.low_stock);

    let ingredients = if query.low_stock.unwrap_or(false) {
        sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT id, name, unit, current_stock, min_threshold, created_at, updated_at
            FROM ingredients
            WHERE current_stock <= min_threshold
            ORDER BY name
            "#,
        )
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT id, name, unit, current_stock, min_threshold, created_at, updated_at
            FROM ingredients
            ORDER BY name
            "#,
        )
        .fetch_all(&state.db)
        .await?
    };

    tracing::debug!("Retrieved {} ingredients", ingredients.len());
    Ok(Json(ingredients))
}

/// Handler for GET /api/ingredients/:id
/// Retrieves a specific ingredient by ID
#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    params(
        ("id" = Uuid, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Ingredient found", body = Ingredient),
        (status = 404, description = "Ingredient not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "ingredients"
)]
async fn get_ingredient_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ingredient>, ApiError> {
    tracing::debug!("Fetching ingredient with id: {}", id);

    let ingredient = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT id, name, unit, current_stock, min_threshold, created_at, updated_at
        FROM ingredients
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound {
        resource: "Ingredient".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ingredient))
}

/// Handler for PUT /api/ingredients/:id
/// Updates an existing ingredient; manual stock edits land here
#[utoipa::path(
    put,
    path = "/api/ingredients/{id}",
    params(
        ("id" = Uuid, Path, description = "Ingredient ID")
    ),
    request_body = UpdateIngredient,
    responses(
        (status = 200, description = "Ingredient updated successfully", body = Ingredient),
        (status = 400, description = "Invalid input data"),
        (status = 404, description = "Ingredient not found"),
        (status = 409, description = "Ingredient name already exists"),
        (status = 500, description = "Internal server error")
    ),
    tag = "ingredients"
)]
async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateIngredient>,
) -> Result<Json<Ingredient>, ApiError> {
    tracing::debug!("Updating ingredient with id: {}", id);

    payload.validate()?;

    // Transaction keeps the exists/duplicate checks and the update atomic
    let mut tx = state.db.begin().await?;

    let existing = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT id, name, unit, current_stock, min_threshold, created_at, updated_at
        FROM ingredients
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::NotFound {
        resource: "Ingredient".to_string(),
        id: id.to_string(),
    })?;

    if let Some(ref new_name) = payload.name {
        if new_name != &existing.name {
            let duplicate_exists: Option<bool> = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM ingredients WHERE name = $1 AND id != $2)",
            )
            .bind(new_name)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            if duplicate_exists.unwrap_or(false) {
                tracing::warn!(
                    "Attempt to rename ingredient {} to duplicate name: {}",
                    id,
                    new_name
                );
                return Err(ApiError::Conflict {
                    message: format!("Ingredient with name '{}' already exists", new_name),
                });
            }
        }
    }

    let updated = sqlx::query_as::<_, Ingredient>(
        r#"
        UPDATE ingredients
        SET name = $1,
            unit = $2,
            current_stock = $3,
            min_threshold = $4,
            updated_at = NOW()
        WHERE id = $5
        RETURNING id, name, unit, current_stock, min_threshold, created_at, updated_at
        "#,
    )
    .bind(payload.name.unwrap_or(existing.name))
    .bind(payload.unit.unwrap_or(existing.unit))
    .bind(payload.current_stock.unwrap_or(existing.current_stock))
    .bind(payload.min_threshold.unwrap_or(existing.min_threshold))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Successfully updated ingredient with id: {}", id);
    Ok(Json(updated))
}

/// Handler for DELETE /api/ingredients/:id
/// Deletes an ingredient, unless a recipe still references it
#[utoipa::path(
    delete,
    path = "/api/ingredients/{id}",
    params(
        ("id" = Uuid, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 204, description = "Ingredient deleted successfully"),
        (status = 404, description = "Ingredient not found"),
        (status = 409, description = "Ingredient is referenced by a recipe"),
        (status = 500, description = "Internal server error")
    ),
    tag = "ingredients"
)]
async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!("Deleting ingredient with id: {}", id);

    if db::ingredient_in_use(&state.db, id).await? {
        return Err(ApiError::Conflict {
            message: "Ingredient is referenced by an active recipe".to_string(),
        });
    }

    let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound {
            resource: "Ingredient".to_string(),
            id: id.to_string(),
        });
    }

    tracing::info!("Successfully deleted ingredient with id: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
fn create_router(db: PgPool, strict_mode: StrictMode) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let stock_engine = Arc::new(StockEngine::new(db.clone(), strict_mode));
    let state = AppState {
        db,
        stock: stock_engine,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Ingredient CRUD
        .route("/api/ingredients", post(create_ingredient))
        .route("/api/ingredients", get(get_all_ingredients))
        .route("/api/ingredients/:id", get(get_ingredient_by_id))
        .route("/api/ingredients/:id", put(update_ingredient))
        .route("/api/ingredients/:id", delete(delete_ingredient))
        // Stock engine
        .route("/api/stock/check", post(stock::handlers::check_stock_handler))
        .route("/api/stock/deduct", post(stock::handlers::deduct_stock_handler))
        .route("/api/stock/history", get(stock::handlers::stock_history_handler))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Kitchen Stock API - Starting...");

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    // Policy for cart lines with no recipe mapping: fail | warn | ignore
    let strict_mode = std::env::var("STRICT_UNMAPPED_ITEMS")
        .ok()
        .and_then(|value| match value.parse::<StrictMode>() {
            Ok(mode) => Some(mode),
            Err(e) => {
                tracing::warn!("{}, falling back to 'warn'", e);
                None
            }
        })
        .unwrap_or_default();
    tracing::info!("Unmapped item policy: {:?}", strict_mode);

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    let app = create_router(db_pool, strict_mode);

    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Kitchen Stock API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}
