use warp::{filters::BoxedFilter, reply::Response, Filter, Rejection, Reply};

use crate::{
    actions::{self, RecipeList},
    error::Error,
    filters::RecipeFilter,
    form::QueryParams,
    jwt::SessionData,
    middleware::{with_possible_session, with_session},
    pagination::Page,
    payload::{RecipePatch, RecipePayload},
    schema::Id,
    state::State,
    RECIPE_COUNT_PER_PAGE, SHOPPING_LIST_FILENAME,
};

use super::{created, json, no_content, with_json, with_query, with_state};

pub fn routes(state: State) -> BoxedFilter<(Response,)> {
    let keys = state.keys.clone();

    let list_recipes = warp::path!("recipes")
        .and(warp::get())
        .and(with_possible_session(keys.clone()))
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(list_recipes);

    let create_recipe = warp::path!("recipes")
        .and(warp::post())
        .and(with_session(keys.clone()))
        .and(with_json())
        .and(with_state(state.clone()))
        .and_then(create_recipe);

    let download_shopping_cart = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(keys.clone()))
        .and(with_state(state.clone()))
        .and_then(download_shopping_cart);

    let recipe = warp::path!("recipes" / Id)
        .and(warp::get())
        .and(with_possible_session(keys.clone()))
        .and(with_state(state.clone()))
        .and_then(recipe);

    let update_recipe = warp::path!("recipes" / Id)
        .and(warp::patch())
        .and(with_session(keys.clone()))
        .and(with_json())
        .and(with_state(state.clone()))
        .and_then(update_recipe);

    let delete_recipe = warp::path!("recipes" / Id)
        .and(warp::delete())
        .and(with_session(keys.clone()))
        .and(with_state(state.clone()))
        .and_then(delete_recipe);

    let favorite_count = warp::path!("recipes" / Id / "favorite_count")
        .and(warp::get())
        .and(with_session(keys.clone()))
        .and(with_state(state.clone()))
        .and_then(favorite_count);

    let add_favorite = warp::path!("recipes" / Id / "favorite")
        .and(warp::post())
        .map(|id: Id| (id, RecipeList::Favorites))
        .untuple_one()
        .and(with_session(keys.clone()))
        .and(with_state(state.clone()))
        .and_then(add_to_list);

    let remove_favorite = warp::path!("recipes" / Id / "favorite")
        .and(warp::delete())
        .map(|id: Id| (id, RecipeList::Favorites))
        .untuple_one()
        .and(with_session(keys.clone()))
        .and(with_state(state.clone()))
        .and_then(remove_from_list);

    let add_to_cart = warp::path!("recipes" / Id / "shopping_cart")
        .and(warp::post())
        .map(|id: Id| (id, RecipeList::ShoppingCart))
        .untuple_one()
        .and(with_session(keys.clone()))
        .and(with_state(state.clone()))
        .and_then(add_to_list);

    let remove_from_cart = warp::path!("recipes" / Id / "shopping_cart")
        .and(warp::delete())
        .map(|id: Id| (id, RecipeList::ShoppingCart))
        .untuple_one()
        .and(with_session(keys))
        .and(with_state(state))
        .and_then(remove_from_list);

    list_recipes
        .or(create_recipe)
        .unify()
        .or(download_shopping_cart)
        .unify()
        .or(recipe)
        .unify()
        .or(update_recipe)
        .unify()
        .or(delete_recipe)
        .unify()
        .or(favorite_count)
        .unify()
        .or(add_favorite)
        .unify()
        .or(remove_favorite)
        .unify()
        .or(add_to_cart)
        .unify()
        .or(remove_from_cart)
        .unify()
        .boxed()
}

async fn list_recipes(
    session: Option<SessionData>,
    query: QueryParams,
    state: State,
) -> Result<Response, Rejection> {
    let filter = RecipeFilter::from_query(&query).map_err(Error::from)?;
    let page = Page::from_query(&query, RECIPE_COUNT_PER_PAGE).map_err(Error::from)?;
    let recipes = actions::fetch_recipes(&state.pool, session.as_ref(), &filter, page).await?;

    Ok(json(&recipes))
}

async fn create_recipe(
    session: SessionData,
    payload: RecipePayload,
    state: State,
) -> Result<Response, Rejection> {
    let recipe = actions::create_recipe(&state.pool, &session, payload).await?;

    Ok(created(&recipe))
}

async fn download_shopping_cart(session: SessionData, state: State) -> Result<Response, Rejection> {
    let shopping_list = actions::get_shopping_list(&state.pool, &session).await?;

    let reply = warp::reply::with_header(
        shopping_list.render(),
        "content-disposition",
        format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
    );

    Ok(reply.into_response())
}

async fn recipe(id: Id, session: Option<SessionData>, state: State) -> Result<Response, Rejection> {
    let recipe = actions::get_recipe_view(&state.pool, session.as_ref(), id).await?;

    Ok(json(&recipe))
}

async fn update_recipe(
    id: Id,
    session: SessionData,
    patch: RecipePatch,
    state: State,
) -> Result<Response, Rejection> {
    let recipe = actions::update_recipe(&state.pool, &session, id, patch).await?;

    Ok(json(&recipe))
}

async fn delete_recipe(id: Id, session: SessionData, state: State) -> Result<Response, Rejection> {
    actions::delete_recipe(&state.pool, &session, id).await?;

    Ok(no_content())
}

async fn favorite_count(id: Id, session: SessionData, state: State) -> Result<Response, Rejection> {
    let count = actions::favorite_count(&state.pool, &session, id).await?;

    Ok(json(&count))
}

async fn add_to_list(
    id: Id,
    list: RecipeList,
    session: SessionData,
    state: State,
) -> Result<Response, Rejection> {
    let recipe = actions::add_to_list(&state.pool, &session, list, id).await?;

    Ok(created(&recipe))
}

async fn remove_from_list(
    id: Id,
    list: RecipeList,
    session: SessionData,
    state: State,
) -> Result<Response, Rejection> {
    actions::remove_from_list(&state.pool, &session, list, id).await?;

    Ok(no_content())
}
