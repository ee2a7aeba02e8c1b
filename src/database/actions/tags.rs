use redis::aio::MultiplexedConnection;
use sqlx::{Pool, Postgres};

use crate::{
    cache::cache::{cached, cached_optional, invalidate_cache, CacheKeyType, CacheLifetime},
    error::{ApiError, Error, QueryError},
    jwt::SessionData,
    payload::TagPayload,
    permissions::ActionType,
    schema::{Id, Tag},
    validation::validate_tag,
};

async fn query_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(list)
}

async fn query_tag(pool: &Pool<Postgres>, id: Id) -> Result<Option<Tag>, Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(tag)
}

pub async fn list_tags(
    pool: &Pool<Postgres>,
    cache: Option<MultiplexedConnection>,
) -> Result<Vec<Tag>, Error> {
    let pool = pool.clone();
    cached(CacheKeyType::Tag.new("all"), cache, move || async move {
        query_tags(&pool).await
    })
    .await
}

pub async fn get_tag(
    pool: &Pool<Postgres>,
    cache: Option<MultiplexedConnection>,
    id: Id,
) -> Result<Tag, Error> {
    let pool = pool.clone();
    cached_optional(CacheKeyType::Tag.new(id), cache, move || async move {
        query_tag(&pool, id).await
    })
    .await?
    .ok_or_else(|| ApiError::NotFound.new("Tag not found"))
}

pub async fn create_tag(
    pool: &Pool<Postgres>,
    cache: Option<MultiplexedConnection>,
    session: &SessionData,
    payload: TagPayload,
) -> Result<Tag, Error> {
    session.authenticate(ActionType::ManageCatalog)?;
    validate_tag(&payload)?;

    let tag: Option<Tag> = sqlx::query_as(
        "INSERT INTO tags (name, slug, color) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING RETURNING *",
    )
    .bind(&payload.name)
    .bind(&payload.slug)
    .bind(&payload.color)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    let tag =
        tag.ok_or_else(|| ApiError::InvalidRequest.new("Tag with this slug or color already exists"))?;

    if let Err(e) = invalidate_cache(CacheLifetime::BindTagCache, cache).await {
        log::error!("Failed to invalidate tag cache: {e}");
    }
    log::info!("Created tag {} ({})", tag.id, tag.slug);

    Ok(tag)
}
