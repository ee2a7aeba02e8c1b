use std::collections::HashSet;

use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, Error, QueryError},
    jwt::SessionData,
    permissions::ActionType,
    schema::{FavoriteCount, Id, ShortRecipe},
    views::ViewerContext,
};

use super::{recipes::require_recipe, subscriptions::subscribed_authors};

/// Per-user recipe collections. Both are plain (user, recipe) pairs, unique per
/// pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    pub fn table(&self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "shopping_cart",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "the shopping cart",
        }
    }

    fn already_present(&self) -> Error {
        ApiError::InvalidRequest.new(&format!("Recipe is already in {}", self.label()))
    }

    fn not_present(&self) -> Error {
        ApiError::InvalidRequest.new(&format!("Recipe is not in {}", self.label()))
    }
}

async fn list_contains(
    pool: &Pool<Postgres>,
    list: RecipeList,
    user_id: Id,
    recipe_id: Id,
) -> Result<bool, Error> {
    let row: (bool,) = sqlx::query_as(&format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = $1 AND recipe_id = $2)",
        list.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row.0)
}

/// Adds a recipe to one of the session user's lists and returns its short form.
pub async fn add_to_list(
    pool: &Pool<Postgres>,
    session: &SessionData,
    list: RecipeList,
    recipe_id: Id,
) -> Result<ShortRecipe, Error> {
    session.authenticate(ActionType::ManageOwnLists)?;

    let recipe = require_recipe(pool, recipe_id).await?;
    if list_contains(pool, list, session.user_id, recipe.id).await? {
        return Err(list.already_present());
    }

    // A concurrent insert of the same pair is caught by the unique constraint
    let query = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        list.table()
    ))
    .bind(session.user_id)
    .bind(recipe.id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(list.already_present());
    }

    Ok(recipe.into())
}

pub async fn remove_from_list(
    pool: &Pool<Postgres>,
    session: &SessionData,
    list: RecipeList,
    recipe_id: Id,
) -> Result<(), Error> {
    session.authenticate(ActionType::ManageOwnLists)?;

    let query = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        list.table()
    ))
    .bind(session.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        require_recipe(pool, recipe_id).await?;
        return Err(list.not_present());
    }

    Ok(())
}

/// Which of `recipe_ids` are on the user's list.
pub async fn list_memberships(
    pool: &Pool<Postgres>,
    list: RecipeList,
    user_id: Id,
    recipe_ids: &[Id],
) -> Result<HashSet<Id>, Error> {
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let rows: Vec<(Id,)> = sqlx::query_as(&format!(
        "SELECT recipe_id FROM {} WHERE user_id = $1 AND recipe_id = ANY($2)",
        list.table()
    ))
    .bind(user_id)
    .bind(recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}

/// Loads, in one batch per relation, everything needed to render viewer
/// relative flags for the given recipes and authors.
pub async fn load_viewer_context(
    pool: &Pool<Postgres>,
    viewer: Option<&SessionData>,
    recipe_ids: &[Id],
    author_ids: &[Id],
) -> Result<ViewerContext, Error> {
    let Some(session) = viewer else {
        return Ok(ViewerContext::anonymous());
    };

    let favorites = list_memberships(pool, RecipeList::Favorites, session.user_id, recipe_ids).await?;
    let shopping_cart =
        list_memberships(pool, RecipeList::ShoppingCart, session.user_id, recipe_ids).await?;
    let subscriptions = subscribed_authors(pool, session.user_id, author_ids).await?;

    Ok(ViewerContext::new(
        session.user_id,
        favorites,
        shopping_cart,
        subscriptions,
    ))
}

/// How many users have the recipe in their favorites. Admin only.
pub async fn favorite_count(
    pool: &Pool<Postgres>,
    session: &SessionData,
    recipe_id: Id,
) -> Result<FavoriteCount, Error> {
    session.authenticate(ActionType::ManageAllRecipes)?;

    let row: Option<FavoriteCount> = sqlx::query_as(
        "
        SELECT r.id, COUNT(f.id) AS favorite_count
        FROM recipes r
        LEFT JOIN favorites f ON f.recipe_id = r.id
        WHERE r.id = $1
        GROUP BY r.id
    ",
    )
    .bind(recipe_id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    row.ok_or_else(|| ApiError::NotFound.new("Recipe not found"))
}
