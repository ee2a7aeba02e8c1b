use std::{
    convert::Infallible,
    fmt::{self, Display},
};

use serde::Serialize;
use sqlx::error::ErrorKind;
use warp::{
    http::StatusCode,
    reject::{self, Reject, Rejection},
    Reply,
};

/// Kinds of failures surfaced to API clients. Build an [`Error`] with
/// [`ApiError::new`] or [`ApiError::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    InvalidRequest,
    InvalidSession,
    Unauthorized,
    NotFound,
    MethodNotAllowed,
    InternalServerError,
}

impl ApiError {
    pub fn code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest => 400,
            ApiError::InvalidSession => 401,
            ApiError::Unauthorized => 403,
            ApiError::NotFound => 404,
            ApiError::MethodNotAllowed => 405,
            ApiError::InternalServerError => 500,
        }
    }

    pub fn new(self, info: &str) -> Error {
        Error {
            code: self.code(),
            info: Some(info.to_string()),
        }
    }

    pub fn default(self) -> Error {
        let info = match self {
            ApiError::InvalidRequest => "Invalid request",
            ApiError::InvalidSession => "Authentication credentials were not provided",
            ApiError::Unauthorized => "You don't have permission to perform this action",
            ApiError::NotFound => "Not found",
            ApiError::MethodNotAllowed => "Method not allowed",
            ApiError::InternalServerError => "Internal server error",
        };

        self.new(info)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub code: u16,
    pub info: Option<String>,
}

impl Error {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.info {
            Some(info) => write!(f, "{} ({})", self.code, info),
            None => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for Error {}
impl Reject for Error {}

/// Constraint names from the schema migration and the message a client sees
/// when a write violates them.
const CONSTRAINT_MESSAGES: &[(&str, &str)] = &[
    ("unique_user_recipe_favorite", "Recipe is already in favorites"),
    ("unique_user_recipe", "Recipe is already in the shopping cart"),
    ("unique_follow", "You are already subscribed to this author"),
    ("user_not_author", "You cannot subscribe to yourself"),
    (
        "unique_ingredients",
        "Ingredient with this name and measurement unit already exists",
    ),
    ("unique_recipe_ingredient", "Ingredients must not repeat"),
    ("recipe_tags_pkey", "Tags must not repeat"),
    ("tags_slug_key", "Tag with this slug already exists"),
    ("tags_color_key", "Tag with this color already exists"),
    ("users_email_key", "User with this email already exists"),
    ("users_username_key", "User with this username already exists"),
    (
        "unique_username_email",
        "User with this username and email already exists",
    ),
];

pub struct QueryError {
    kind: ApiError,
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self {
            kind: ApiError::InternalServerError,
            info,
        }
    }

    fn constraint(kind: ApiError, constraint: Option<&str>, fallback: &str) -> Self {
        let info = constraint
            .and_then(|name| {
                CONSTRAINT_MESSAGES
                    .iter()
                    .find(|(constraint, _)| *constraint == name)
                    .map(|(_, message)| message.to_string())
            })
            .unwrap_or_else(|| fallback.to_string());

        Self { kind, info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Self {
                kind: ApiError::NotFound,
                info: String::from("Not found"),
            },
            sqlx::Error::Database(e) => match e.kind() {
                ErrorKind::UniqueViolation => {
                    Self::constraint(ApiError::InvalidRequest, e.constraint(), "Already exists")
                }
                ErrorKind::CheckViolation => {
                    Self::constraint(ApiError::InvalidRequest, e.constraint(), "Invalid value")
                }
                ErrorKind::ForeignKeyViolation => {
                    Self::constraint(ApiError::NotFound, e.constraint(), "Referenced row not found")
                }
                _ => Self::new(format!("{e}")),
            },
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(String::from("Worker crashed")),
            e => Self::new(format!("{e}")),
        }
    }
}

impl From<QueryError> for Error {
    fn from(value: QueryError) -> Self {
        if value.kind == ApiError::InternalServerError {
            log::error!("Query failed: {}", value.info);
            return ApiError::InternalServerError.default();
        }

        value.kind.new(&value.info)
    }
}

pub struct CacheError {
    info: String,
}

impl From<redis::RedisError> for CacheError {
    fn from(value: redis::RedisError) -> Self {
        Self {
            info: format!("{:?} - {:?}", value.code(), value.detail()),
        }
    }
}

impl From<CacheError> for Error {
    fn from(value: CacheError) -> Self {
        log::error!("Cache failed: {}", value.info);
        ApiError::InternalServerError.default()
    }
}

#[derive(Debug)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl From<TypeError> for Error {
    fn from(value: TypeError) -> Self {
        ApiError::InvalidRequest.new(&value.info)
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}

#[derive(Serialize)]
struct ErrorMessage<'a> {
    errors: &'a str,
}

/// Converts every rejection produced by the API filter into a JSON error body.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let error = if err.is_not_found() {
        ApiError::NotFound.default()
    } else if let Some(e) = err.find::<Error>() {
        e.clone()
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiError::InvalidRequest.new(&e.to_string())
    } else if let Some(e) = err.find::<reject::InvalidQuery>() {
        ApiError::InvalidRequest.new(&e.to_string())
    } else if let Some(e) = err.find::<reject::InvalidHeader>() {
        ApiError::InvalidRequest.new(&e.to_string())
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiError::MethodNotAllowed.default()
    } else if let Some(e) = err.find::<reject::PayloadTooLarge>() {
        Error {
            code: 413,
            info: Some(e.to_string()),
        }
    } else if let Some(e) = err.find::<reject::LengthRequired>() {
        Error {
            code: 411,
            info: Some(e.to_string()),
        }
    } else if let Some(e) = err.find::<reject::UnsupportedMediaType>() {
        Error {
            code: 415,
            info: Some(e.to_string()),
        }
    } else {
        log::error!("Unhandled rejection: {err:?}");
        ApiError::InternalServerError.default()
    };

    let body = warp::reply::json(&ErrorMessage {
        errors: error.info.as_deref().unwrap_or_default(),
    });

    Ok(warp::reply::with_status(body, error.status()))
}
