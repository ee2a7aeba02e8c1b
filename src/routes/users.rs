use serde::Serialize;
use warp::{filters::BoxedFilter, reply::Response, Filter, Rejection};

use crate::{
    actions,
    error::Error,
    filters::recipes_limit,
    form::QueryParams,
    jwt::SessionData,
    middleware::{with_possible_session, with_session},
    pagination::Page,
    payload::{LoginPayload, PasswordPayload, RegisterPayload},
    schema::Id,
    state::State,
    SUBSCRIPTION_COUNT_PER_PAGE, USER_COUNT_PER_PAGE,
};

use super::{created, json, no_content, with_json, with_query, with_state};

#[derive(Serialize)]
struct TokenResponse {
    auth_token: String,
}

pub fn routes(state: State) -> BoxedFilter<(Response,)> {
    let keys = state.keys.clone();

    let token_login = warp::path!("auth" / "token" / "login")
        .and(warp::post())
        .and(with_json())
        .and(with_state(state.clone()))
        .and_then(token_login);

    let list_users = warp::path!("users")
        .and(warp::get())
        .and(with_possible_session(keys.clone()))
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(list_users);

    let register = warp::path!("users")
        .and(warp::post())
        .and(with_json())
        .and(with_state(state.clone()))
        .and_then(register);

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_session(keys.clone()))
        .and(with_state(state.clone()))
        .and_then(me);

    let set_password = warp::path!("users" / "set_password")
        .and(warp::post())
        .and(with_session(keys.clone()))
        .and(with_json())
        .and(with_state(state.clone()))
        .and_then(set_password);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(with_session(keys.clone()))
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(subscriptions);

    let user = warp::path!("users" / Id)
        .and(warp::get())
        .and(with_possible_session(keys.clone()))
        .and(with_state(state.clone()))
        .and_then(user);

    let subscribe = warp::path!("users" / Id / "subscribe")
        .and(warp::post())
        .and(with_session(keys.clone()))
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(subscribe);

    let unsubscribe = warp::path!("users" / Id / "subscribe")
        .and(warp::delete())
        .and(with_session(keys))
        .and(with_state(state))
        .and_then(unsubscribe);

    token_login
        .or(list_users)
        .unify()
        .or(register)
        .unify()
        .or(me)
        .unify()
        .or(set_password)
        .unify()
        .or(subscriptions)
        .unify()
        .or(user)
        .unify()
        .or(subscribe)
        .unify()
        .or(unsubscribe)
        .unify()
        .boxed()
}

async fn token_login(payload: LoginPayload, state: State) -> Result<Response, Rejection> {
    let auth_token = actions::login_user(&state.pool, &state.keys, payload).await?;

    Ok(json(&TokenResponse { auth_token }))
}

async fn list_users(
    session: Option<SessionData>,
    query: QueryParams,
    state: State,
) -> Result<Response, Rejection> {
    let page = Page::from_query(&query, USER_COUNT_PER_PAGE).map_err(Error::from)?;
    let users = actions::fetch_users(&state.pool, session.as_ref(), page).await?;

    Ok(json(&users))
}

async fn register(payload: RegisterPayload, state: State) -> Result<Response, Rejection> {
    let user = actions::register_user(&state.pool, payload).await?;

    Ok(created(&user))
}

async fn me(session: SessionData, state: State) -> Result<Response, Rejection> {
    let user = actions::get_user_view(&state.pool, Some(&session), session.user_id).await?;

    Ok(json(&user))
}

async fn set_password(
    session: SessionData,
    payload: PasswordPayload,
    state: State,
) -> Result<Response, Rejection> {
    actions::set_password(&state.pool, &session, payload).await?;

    Ok(no_content())
}

async fn subscriptions(
    session: SessionData,
    query: QueryParams,
    state: State,
) -> Result<Response, Rejection> {
    let page = Page::from_query(&query, SUBSCRIPTION_COUNT_PER_PAGE).map_err(Error::from)?;
    let subscriptions =
        actions::list_subscriptions(&state.pool, &session, page, recipes_limit(&query)).await?;

    Ok(json(&subscriptions))
}

async fn user(id: Id, session: Option<SessionData>, state: State) -> Result<Response, Rejection> {
    let user = actions::get_user_view(&state.pool, session.as_ref(), id).await?;

    Ok(json(&user))
}

async fn subscribe(
    id: Id,
    session: SessionData,
    query: QueryParams,
    state: State,
) -> Result<Response, Rejection> {
    let subscription =
        actions::subscribe(&state.pool, &session, id, recipes_limit(&query)).await?;

    Ok(created(&subscription))
}

async fn unsubscribe(id: Id, session: SessionData, state: State) -> Result<Response, Rejection> {
    actions::unsubscribe(&state.pool, &session, id).await?;

    Ok(no_content())
}
