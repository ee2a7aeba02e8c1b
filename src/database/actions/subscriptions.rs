use std::collections::{HashMap, HashSet};

use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, Error, QueryError},
    jwt::SessionData,
    pagination::{Page, PageContext},
    permissions::ActionType,
    schema::{AuthoredRecipe, Id, RecipeCount, ShortRecipe, User, UserRow},
    views::{SubscriptionView, UserView},
};

use super::{lists::load_viewer_context, users::require_user};

/// Which of `author_ids` the user follows.
pub async fn subscribed_authors(
    pool: &Pool<Postgres>,
    user_id: Id,
    author_ids: &[Id],
) -> Result<HashSet<Id>, Error> {
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let rows: Vec<(Id,)> = sqlx::query_as(
        "SELECT author_id FROM subscriptions WHERE user_id = $1 AND author_id = ANY($2)",
    )
    .bind(user_id)
    .bind(author_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}

pub async fn subscribe(
    pool: &Pool<Postgres>,
    session: &SessionData,
    author_id: Id,
    recipes_limit: Option<i64>,
) -> Result<SubscriptionView, Error> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    let author = require_user(pool, author_id).await?;
    if author.id == session.user_id {
        return Err(ApiError::InvalidRequest.new("You cannot subscribe to yourself"));
    }

    let already_subscribed = || ApiError::InvalidRequest.new("You are already subscribed to this author");
    if !subscribed_authors(pool, session.user_id, &[author.id])
        .await?
        .is_empty()
    {
        return Err(already_subscribed());
    }

    let query = sqlx::query(
        "INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(session.user_id)
    .bind(author.id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(already_subscribed());
    }
    log::info!("User {} subscribed to {}", session.user_id, author.id);

    load_subscription_views(pool, session, vec![author], recipes_limit)
        .await?
        .pop()
        .ok_or_else(|| ApiError::NotFound.new("User not found"))
}

pub async fn unsubscribe(
    pool: &Pool<Postgres>,
    session: &SessionData,
    author_id: Id,
) -> Result<(), Error> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    let author = require_user(pool, author_id).await?;
    let query = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(session.user_id)
        .bind(author.id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(ApiError::InvalidRequest.new("You are not subscribed to this author"));
    }

    Ok(())
}

/// Authors the session user follows, oldest subscription first.
pub async fn list_subscriptions(
    pool: &Pool<Postgres>,
    session: &SessionData,
    page: Page,
    recipes_limit: Option<i64>,
) -> Result<PageContext<SubscriptionView>, Error> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.*, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY s.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(session.user_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = match rows.first() {
        Some(row) => row.count,
        None if page.offset > 0 => {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
                    .bind(session.user_id)
                    .fetch_one(pool)
                    .await
                    .map_err(QueryError::from)?;
            count
        }
        None => 0,
    };
    let authors = rows.into_iter().map(|row| row.user).collect();
    let views = load_subscription_views(pool, session, authors, recipes_limit).await?;

    Ok(PageContext::from_rows(views, total_count, page))
}

/// Each author with their newest recipes (at most `recipes_limit` when given)
/// and their total recipe count.
async fn load_subscription_views(
    pool: &Pool<Postgres>,
    session: &SessionData,
    authors: Vec<User>,
    recipes_limit: Option<i64>,
) -> Result<Vec<SubscriptionView>, Error> {
    if authors.is_empty() {
        return Ok(vec![]);
    }

    let author_ids: Vec<Id> = authors.iter().map(|author| author.id).collect();

    let counts: Vec<RecipeCount> = sqlx::query_as(
        "
        SELECT author_id, COUNT(*) AS recipes_count
        FROM recipes
        WHERE author_id = ANY($1)
        GROUP BY author_id
    ",
    )
    .bind(&author_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let recipes: Vec<AuthoredRecipe> = sqlx::query_as(
        "
        SELECT author_id, id, name, image, cooking_time
        FROM (
            SELECT r.*, ROW_NUMBER() OVER (
                PARTITION BY r.author_id ORDER BY r.pub_date DESC, r.id DESC
            ) AS position
            FROM recipes r
            WHERE r.author_id = ANY($1)
        ) ranked
        WHERE $2::BIGINT IS NULL OR position <= $2
        ORDER BY author_id, position
    ",
    )
    .bind(&author_ids)
    .bind(recipes_limit)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let context = load_viewer_context(pool, Some(session), &[], &author_ids).await?;

    let counts: HashMap<Id, i64> = counts
        .into_iter()
        .map(|count| (count.author_id, count.recipes_count))
        .collect();

    let mut recipes_by_author: HashMap<Id, Vec<ShortRecipe>> = HashMap::new();
    for authored in recipes {
        recipes_by_author
            .entry(authored.author_id)
            .or_default()
            .push(authored.recipe);
    }

    Ok(authors
        .into_iter()
        .map(|author| SubscriptionView {
            author: UserView::new(&author, &context),
            recipes: recipes_by_author.remove(&author.id).unwrap_or_default(),
            recipes_count: counts.get(&author.id).copied().unwrap_or(0),
        })
        .collect())
}
