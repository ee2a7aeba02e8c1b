use std::collections::{HashMap, HashSet};

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    error::{ApiError, Error, QueryError},
    filters::RecipeFilter,
    jwt::SessionData,
    pagination::{Page, PageContext},
    payload::{IngredientAmount, RecipePatch, RecipePayload},
    permissions::ActionType,
    schema::{Id, LinkedTag, Recipe, RecipePart, RecipeRow, Tag, User},
    validation::{validate_recipe, validate_recipe_patch},
    views::RecipeView,
};

use super::lists::{load_viewer_context, RecipeList};

pub async fn get_recipe(pool: &Pool<Postgres>, recipe_id: Id) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn require_recipe(pool: &Pool<Postgres>, recipe_id: Id) -> Result<Recipe, Error> {
    get_recipe(pool, recipe_id)
        .await?
        .ok_or_else(|| ApiError::NotFound.new("Recipe not found"))
}

/// Recipe the session may modify: its own, or any recipe for admins.
async fn get_recipe_mut(
    pool: &Pool<Postgres>,
    session: &SessionData,
    recipe_id: Id,
) -> Result<Recipe, Error> {
    let recipe = require_recipe(pool, recipe_id).await?;

    if recipe.author_id == session.user_id {
        session.authenticate(ActionType::ManageOwnRecipes)?;
    } else {
        session.authenticate(ActionType::ManageAllRecipes)?;
    }

    Ok(recipe)
}

pub async fn fetch_recipes(
    pool: &Pool<Postgres>,
    viewer: Option<&SessionData>,
    filter: &RecipeFilter,
    page: Page,
) -> Result<PageContext<RecipeView>, Error> {
    // Anonymous users have no lists to filter by
    let session = match (viewer, filter.requires_viewer()) {
        (None, true) => return Ok(PageContext::no_rows()),
        (session, _) => session,
    };

    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");
    push_recipe_filter(&mut query, session, filter);
    query
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    let rows: Vec<RecipeRow> = query
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    let total_count = match rows.first() {
        Some(row) => row.count,
        None if page.offset > 0 => count_recipes(pool, session, filter).await?,
        None => 0,
    };
    let recipes = rows.into_iter().map(|row| row.recipe).collect();
    let views = load_recipe_views(pool, session, recipes).await?;

    Ok(PageContext::from_rows(views, total_count, page))
}

fn push_recipe_filter(
    query: &mut QueryBuilder<'_, Postgres>,
    session: Option<&SessionData>,
    filter: &RecipeFilter,
) {
    if !filter.tags.is_empty() {
        query
            .push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id \
                 WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(filter.tags.to_owned())
            .push("))");
    }

    if let Some(author) = filter.author {
        query.push(" AND r.author_id = ").push_bind(author);
    }

    let Some(session) = session else { return };
    let memberships = [
        (RecipeList::Favorites, filter.is_favorited),
        (RecipeList::ShoppingCart, filter.is_in_shopping_cart),
    ];
    for (list, wanted) in memberships {
        let Some(wanted) = wanted else { continue };
        // A false flag selects the recipes outside the list instead of none at all
        let negation = if wanted { "" } else { " NOT" };
        query
            .push(format!(
                " AND{negation} EXISTS (SELECT 1 FROM {} l WHERE l.recipe_id = r.id AND l.user_id = ",
                list.table()
            ))
            .push_bind(session.user_id)
            .push(")");
    }
}

/// Total matches for `filter`, used when the requested page is past the end.
async fn count_recipes(
    pool: &Pool<Postgres>,
    session: Option<&SessionData>,
    filter: &RecipeFilter,
) -> Result<i64, Error> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM recipes r WHERE TRUE");
    push_recipe_filter(&mut query, session, filter);

    let count: i64 = query
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(count)
}

/// Renders full representations for `recipes`, keeping their order. Tags,
/// ingredients, authors and viewer memberships are loaded in batch.
pub async fn load_recipe_views(
    pool: &Pool<Postgres>,
    viewer: Option<&SessionData>,
    recipes: Vec<Recipe>,
) -> Result<Vec<RecipeView>, Error> {
    if recipes.is_empty() {
        return Ok(vec![]);
    }

    let recipe_ids: Vec<Id> = recipes.iter().map(|recipe| recipe.id).collect();
    let mut author_ids: Vec<Id> = recipes.iter().map(|recipe| recipe.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let tags: Vec<LinkedTag> = sqlx::query_as(
        "
        SELECT rt.recipe_id, t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY t.name
    ",
    )
    .bind(&recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let parts: Vec<RecipePart> = sqlx::query_as(
        "
        SELECT ri.recipe_id, ri.ingredient_id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY ri.id
    ",
    )
    .bind(&recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let authors: Vec<User> = sqlx::query_as("SELECT * FROM users WHERE id = ANY($1)")
        .bind(&author_ids)
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    let context = load_viewer_context(pool, viewer, &recipe_ids, &author_ids).await?;

    let mut tags_by_recipe: HashMap<Id, Vec<Tag>> = HashMap::new();
    for linked in tags {
        tags_by_recipe
            .entry(linked.recipe_id)
            .or_default()
            .push(linked.tag);
    }

    let mut parts_by_recipe: HashMap<Id, Vec<RecipePart>> = HashMap::new();
    for part in parts {
        parts_by_recipe.entry(part.recipe_id).or_default().push(part);
    }

    let authors: HashMap<Id, User> = authors.into_iter().map(|user| (user.id, user)).collect();

    recipes
        .into_iter()
        .map(|recipe| -> Result<RecipeView, Error> {
            let author = authors.get(&recipe.author_id).ok_or_else(|| {
                QueryError::new(format!(
                    "Author {} of recipe {} is missing",
                    recipe.author_id, recipe.id
                ))
            })?;
            let tags = tags_by_recipe.remove(&recipe.id).unwrap_or_default();
            let parts = parts_by_recipe.remove(&recipe.id).unwrap_or_default();

            Ok(RecipeView::new(recipe, tags, parts, author, &context))
        })
        .collect()
}

pub async fn get_recipe_view(
    pool: &Pool<Postgres>,
    viewer: Option<&SessionData>,
    recipe_id: Id,
) -> Result<RecipeView, Error> {
    let recipe = require_recipe(pool, recipe_id).await?;

    load_recipe_views(pool, viewer, vec![recipe])
        .await?
        .pop()
        .ok_or_else(|| ApiError::NotFound.new("Recipe not found"))
}

/// Unknown ingredients are reported as missing, unknown tags as invalid input.
async fn ensure_references(
    conn: &mut PgConnection,
    ingredients: &[IngredientAmount],
    tags: &[Id],
) -> Result<(), Error> {
    let ingredient_ids: Vec<Id> = ingredients.iter().map(|ingredient| ingredient.id).collect();
    let found: Vec<(Id,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(&ingredient_ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(QueryError::from)?;
    let found: HashSet<Id> = found.into_iter().map(|row| row.0).collect();

    if let Some(missing) = ingredient_ids.iter().find(|id| !found.contains(id)) {
        return Err(ApiError::NotFound.new(&format!("Ingredient {missing} not found")));
    }

    let found: Vec<(Id,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(tags)
        .fetch_all(&mut *conn)
        .await
        .map_err(QueryError::from)?;
    let found: HashSet<Id> = found.into_iter().map(|row| row.0).collect();

    if let Some(missing) = tags.iter().find(|id| !found.contains(id)) {
        return Err(ApiError::InvalidRequest.new(&format!("Tag {missing} does not exist")));
    }

    Ok(())
}

/// Drops every ingredient and tag link of the recipe and inserts the given
/// ones. Ingredients keep the order they were submitted in.
async fn replace_associations(
    conn: &mut PgConnection,
    recipe_id: Id,
    ingredients: &[IngredientAmount],
    tags: &[Id],
) -> Result<(), Error> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    query.push_values(ingredients, |mut row, ingredient| {
        row.push_bind(recipe_id)
            .push_bind(ingredient.id)
            .push_bind(ingredient.amount);
    });
    query
        .build()
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    query.push_values(tags, |mut row, tag| {
        row.push_bind(recipe_id).push_bind(*tag);
    });
    query
        .build()
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

pub async fn create_recipe(
    pool: &Pool<Postgres>,
    session: &SessionData,
    payload: RecipePayload,
) -> Result<RecipeView, Error> {
    session.authenticate(ActionType::CreateRecipes)?;
    validate_recipe(&payload)?;

    let mut tr = pool.begin().await.map_err(QueryError::from)?;

    ensure_references(&mut tr, &payload.ingredients, &payload.tags).await?;

    let recipe: Recipe = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(session.user_id)
    .bind(&payload.name)
    .bind(&payload.image)
    .bind(&payload.text)
    .bind(payload.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    replace_associations(&mut tr, recipe.id, &payload.ingredients, &payload.tags).await?;

    tr.commit().await.map_err(QueryError::from)?;
    log::info!("User {} created recipe {}", session.user_id, recipe.id);

    get_recipe_view(pool, Some(session), recipe.id).await
}

pub async fn update_recipe(
    pool: &Pool<Postgres>,
    session: &SessionData,
    recipe_id: Id,
    patch: RecipePatch,
) -> Result<RecipeView, Error> {
    let recipe = get_recipe_mut(pool, session, recipe_id).await?;
    validate_recipe_patch(&patch)?;

    let mut tr = pool.begin().await.map_err(QueryError::from)?;

    ensure_references(&mut tr, &patch.ingredients, &patch.tags).await?;

    sqlx::query(
        "
        UPDATE recipes SET
            name = COALESCE($2, name),
            image = COALESCE($3, image),
            text = COALESCE($4, text),
            cooking_time = COALESCE($5, cooking_time)
        WHERE id = $1
    ",
    )
    .bind(recipe.id)
    .bind(&patch.name)
    .bind(&patch.image)
    .bind(&patch.text)
    .bind(patch.cooking_time)
    .execute(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    replace_associations(&mut tr, recipe.id, &patch.ingredients, &patch.tags).await?;

    tr.commit().await.map_err(QueryError::from)?;
    log::info!("User {} updated recipe {}", session.user_id, recipe.id);

    get_recipe_view(pool, Some(session), recipe.id).await
}

pub async fn delete_recipe(
    pool: &Pool<Postgres>,
    session: &SessionData,
    recipe_id: Id,
) -> Result<(), Error> {
    let recipe = get_recipe_mut(pool, session, recipe_id).await?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe.id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;
    log::info!("User {} deleted recipe {}", session.user_id, recipe.id);

    Ok(())
}
