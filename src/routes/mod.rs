use std::convert::Infallible;

use serde::de::DeserializeOwned;
use warp::{http::StatusCode, reply::Response, Filter, Rejection, Reply};

use crate::{
    error::handle_rejection,
    form::{QueryData, QueryParams},
    state::State,
    MAX_BODY_SIZE,
};

mod catalog;
mod recipes;
mod users;

/// The whole REST surface under `/api`, with every rejection rendered as a
/// JSON error.
pub fn api(state: State) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let routes = users::routes(state.clone())
        .or(catalog::routes(state.clone()))
        .unify()
        .or(recipes::routes(state))
        .unify();

    warp::path("api")
        .and(routes)
        .recover(handle_rejection)
        .with(warp::log("foodgram::api"))
}

fn with_state(state: State) -> impl Filter<Extract = (State,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn with_query() -> impl Filter<Extract = (QueryParams,), Error = Rejection> + Clone {
    warp::query::<QueryData>().map(QueryParams::from_data)
}

fn with_json<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
{
    warp::body::content_length_limit(MAX_BODY_SIZE).and(warp::body::json())
}

fn json<T: serde::Serialize>(value: &T) -> Response {
    warp::reply::json(value).into_response()
}

fn created<T: serde::Serialize>(value: &T) -> Response {
    warp::reply::with_status(warp::reply::json(value), StatusCode::CREATED).into_response()
}

fn no_content() -> Response {
    warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT).into_response()
}
