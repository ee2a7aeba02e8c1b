use warp::{filters::BoxedFilter, reply::Response, Filter, Rejection};

use crate::{
    actions,
    filters::IngredientFilter,
    form::QueryParams,
    jwt::SessionData,
    middleware::with_session,
    payload::{IngredientPayload, TagPayload},
    schema::Id,
    state::State,
};

use super::{created, json, with_json, with_query, with_state};

pub fn routes(state: State) -> BoxedFilter<(Response,)> {
    let keys = state.keys.clone();

    let list_tags = warp::path!("tags")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(list_tags);

    let create_tag = warp::path!("tags")
        .and(warp::post())
        .and(with_session(keys.clone()))
        .and(with_json())
        .and(with_state(state.clone()))
        .and_then(create_tag);

    let tag = warp::path!("tags" / Id)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(tag);

    let list_ingredients = warp::path!("ingredients")
        .and(warp::get())
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(list_ingredients);

    let create_ingredient = warp::path!("ingredients")
        .and(warp::post())
        .and(with_session(keys))
        .and(with_json())
        .and(with_state(state.clone()))
        .and_then(create_ingredient);

    let ingredient = warp::path!("ingredients" / Id)
        .and(warp::get())
        .and(with_state(state))
        .and_then(ingredient);

    list_tags
        .or(create_tag)
        .unify()
        .or(tag)
        .unify()
        .or(list_ingredients)
        .unify()
        .or(create_ingredient)
        .unify()
        .or(ingredient)
        .unify()
        .boxed()
}

async fn list_tags(state: State) -> Result<Response, Rejection> {
    let tags = actions::list_tags(&state.pool, state.cache.clone()).await?;

    Ok(json(&tags))
}

async fn create_tag(
    session: SessionData,
    payload: TagPayload,
    state: State,
) -> Result<Response, Rejection> {
    let tag = actions::create_tag(&state.pool, state.cache.clone(), &session, payload).await?;

    Ok(created(&tag))
}

async fn tag(id: Id, state: State) -> Result<Response, Rejection> {
    let tag = actions::get_tag(&state.pool, state.cache.clone(), id).await?;

    Ok(json(&tag))
}

async fn list_ingredients(query: QueryParams, state: State) -> Result<Response, Rejection> {
    let filter = IngredientFilter::from_query(&query);
    let ingredients = actions::list_ingredients(&state.pool, state.cache.clone(), &filter).await?;

    Ok(json(&ingredients))
}

async fn create_ingredient(
    session: SessionData,
    payload: IngredientPayload,
    state: State,
) -> Result<Response, Rejection> {
    let ingredient =
        actions::create_ingredient(&state.pool, state.cache.clone(), &session, payload).await?;

    Ok(created(&ingredient))
}

async fn ingredient(id: Id, state: State) -> Result<Response, Rejection> {
    let ingredient = actions::get_ingredient(&state.pool, state.cache.clone(), id).await?;

    Ok(json(&ingredient))
}
