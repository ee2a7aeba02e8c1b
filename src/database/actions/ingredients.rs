use redis::aio::MultiplexedConnection;
use sqlx::{Pool, Postgres};

use crate::{
    cache::cache::{cached, cached_optional, invalidate_cache, CacheKeyType, CacheLifetime},
    error::{ApiError, Error, QueryError},
    filters::IngredientFilter,
    jwt::SessionData,
    payload::IngredientPayload,
    permissions::ActionType,
    schema::{Id, Ingredient},
    validation::validate_ingredient,
};

async fn query_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, Error> {
    let list: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients ORDER BY name, id")
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(list)
}

async fn query_ingredient(pool: &Pool<Postgres>, id: Id) -> Result<Option<Ingredient>, Error> {
    let ingredient: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(ingredient)
}

/// Ingredients whose name starts with the filter's `name`, case-sensitive.
/// The whole catalog is cached once and narrowed per request.
pub async fn list_ingredients(
    pool: &Pool<Postgres>,
    cache: Option<MultiplexedConnection>,
    filter: &IngredientFilter,
) -> Result<Vec<Ingredient>, Error> {
    let pool = pool.clone();
    let catalog = cached(CacheKeyType::Ingredient.new("all"), cache, move || async move {
        query_ingredients(&pool).await
    })
    .await?;

    Ok(catalog
        .into_iter()
        .filter(|ingredient| filter.matches(ingredient))
        .collect())
}

pub async fn get_ingredient(
    pool: &Pool<Postgres>,
    cache: Option<MultiplexedConnection>,
    id: Id,
) -> Result<Ingredient, Error> {
    let pool = pool.clone();
    cached_optional(CacheKeyType::Ingredient.new(id), cache, move || async move {
        query_ingredient(&pool, id).await
    })
    .await?
    .ok_or_else(|| ApiError::NotFound.new("Ingredient not found"))
}

pub async fn create_ingredient(
    pool: &Pool<Postgres>,
    cache: Option<MultiplexedConnection>,
    session: &SessionData,
    payload: IngredientPayload,
) -> Result<Ingredient, Error> {
    session.authenticate(ActionType::ManageCatalog)?;
    validate_ingredient(&payload)?;

    let ingredient: Option<Ingredient> = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING RETURNING *
    ",
    )
    .bind(&payload.name)
    .bind(&payload.measurement_unit)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    let ingredient = ingredient.ok_or_else(|| {
        ApiError::InvalidRequest.new("Ingredient with this name and measurement unit already exists")
    })?;

    if let Err(e) = invalidate_cache(CacheLifetime::BindIngredientCache, cache).await {
        log::error!("Failed to invalidate ingredient cache: {e}");
    }
    log::info!("Created ingredient {} ({})", ingredient.id, ingredient.name);

    Ok(ingredient)
}
