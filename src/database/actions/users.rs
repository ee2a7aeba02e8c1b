use sqlx::{Pool, Postgres};

use crate::{
    cryptography::{hash_password, verify_password},
    error::{ApiError, Error, QueryError},
    jwt::{SessionData, SessionKeys},
    pagination::{Page, PageContext},
    payload::{LoginPayload, PasswordPayload, RegisterPayload},
    schema::{Id, User, UserRow},
    validation::{validate_password_change, validate_registration},
    views::{CreatedUser, UserView},
};

use super::lists::load_viewer_context;

pub async fn get_user(pool: &Pool<Postgres>, email: &str) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Id) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn require_user(pool: &Pool<Postgres>, user_id: Id) -> Result<User, Error> {
    get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound.new("User not found"))
}

/// Creates a user from a registration form. The password is stored as an
/// argon2 hash.
pub async fn register_user(
    pool: &Pool<Postgres>,
    payload: RegisterPayload,
) -> Result<CreatedUser, Error> {
    validate_registration(&payload)?;

    let taken: Option<(String,)> =
        sqlx::query_as("SELECT email FROM users WHERE email = $1 OR username = $2 LIMIT 1")
            .bind(&payload.email)
            .bind(&payload.username)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;
    if let Some((email,)) = taken {
        let field = if email == payload.email {
            "email"
        } else {
            "username"
        };
        return Err(ApiError::InvalidRequest.new(&format!("User with this {field} already exists")));
    }

    let password = hash_password(&payload.password)?;
    let user: Option<User> = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING *
    ",
    )
    .bind(&payload.email)
    .bind(&payload.username)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(password)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    let user = user.ok_or_else(|| {
        ApiError::InvalidRequest.new("User with this email or username already exists")
    })?;
    log::info!("Registered user {}", user.id);

    Ok(user.into())
}

pub async fn login_user(
    pool: &Pool<Postgres>,
    keys: &SessionKeys,
    payload: LoginPayload,
) -> Result<String, Error> {
    let invalid = || ApiError::InvalidRequest.new("Unable to log in with provided credentials");

    let user = get_user(pool, &payload.email).await?.ok_or_else(invalid)?;
    if !verify_password(&payload.password, &user.password)? {
        log::warn!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    keys.generate_jwt_session(&user)
}

pub async fn set_password(
    pool: &Pool<Postgres>,
    session: &SessionData,
    payload: PasswordPayload,
) -> Result<(), Error> {
    validate_password_change(&payload)?;

    let user = require_user(pool, session.user_id).await?;
    if !verify_password(&payload.current_password, &user.password)? {
        return Err(ApiError::InvalidRequest.new("Current password is incorrect"));
    }

    let password = hash_password(&payload.new_password)?;
    sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
        .bind(user.id)
        .bind(password)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

pub async fn fetch_users(
    pool: &Pool<Postgres>,
    viewer: Option<&SessionData>,
    page: Page,
) -> Result<PageContext<UserView>, Error> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "SELECT *, COUNT(*) OVER() AS count FROM users ORDER BY id LIMIT $1 OFFSET $2",
    )
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = match rows.first() {
        Some(row) => row.count,
        None if page.offset > 0 => {
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
                .fetch_one(pool)
                .await
                .map_err(QueryError::from)?;
            count
        }
        None => 0,
    };
    let users: Vec<User> = rows.into_iter().map(|row| row.user).collect();
    let user_ids: Vec<Id> = users.iter().map(|user| user.id).collect();

    let context = load_viewer_context(pool, viewer, &[], &user_ids).await?;

    Ok(PageContext::from_rows(users, total_count, page).map(|user| UserView::new(&user, &context)))
}

pub async fn get_user_view(
    pool: &Pool<Postgres>,
    viewer: Option<&SessionData>,
    user_id: Id,
) -> Result<UserView, Error> {
    let user = require_user(pool, user_id).await?;
    let context = load_viewer_context(pool, viewer, &[], &[user.id]).await?;

    Ok(UserView::new(&user, &context))
}
