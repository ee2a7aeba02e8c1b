use chrono::Duration;
use foodgram::{
    jwt::SessionKeys,
    routes,
    schema::{Id, User, UserRole},
    State,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use warp::http::StatusCode;

const SECRET: &[u8] = b"test secret";

fn keys() -> SessionKeys {
    SessionKeys::new(SECRET, Duration::hours(1)).unwrap()
}

async fn insert_user(pool: &PgPool, username: &str, role: UserRole) -> User {
    sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password, role)
        VALUES ($1, $2, 'Ada', 'Lovelace', '', $3)
        RETURNING *
    ",
    )
    .bind(format!("{username}@example.com"))
    .bind(username)
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn insert_ingredient(pool: &PgPool, name: &str, unit: &str) -> Id {
    let (id,): (Id,) = sqlx::query_as(
        "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(unit)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

async fn insert_tag(pool: &PgPool, slug: &str, color: &str) -> Id {
    let (id,): (Id,) =
        sqlx::query_as("INSERT INTO tags (name, slug, color) VALUES ($1, $1, $2) RETURNING id")
            .bind(slug)
            .bind(color)
            .fetch_one(pool)
            .await
            .unwrap();
    id
}

async fn count(pool: &PgPool, sql: &str, recipe_id: Id) -> i64 {
    let (count,): (i64,) = sqlx::query_as(sql)
        .bind(recipe_id)
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

async fn send(
    pool: &PgPool,
    method: &str,
    path: &str,
    user: Option<&User>,
    payload: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let api = routes::api(State::from_parts(pool.clone(), None, keys()));

    let mut request = warp::test::request().method(method).path(path);
    if let Some(user) = user {
        let token = keys().generate_jwt_session(user).unwrap();
        request = request.header("authorization", format!("Token {token}"));
    }
    if let Some(payload) = payload {
        request = request.json(&payload);
    }

    let response = request.reply(&api).await;
    (response.status(), response.body().to_vec())
}

async fn send_json(
    pool: &PgPool,
    method: &str,
    path: &str,
    user: Option<&User>,
    payload: Option<Value>,
) -> (StatusCode, Value) {
    let (status, body) = send(pool, method, path, user, payload).await;
    let body = match body.is_empty() {
        true => Value::Null,
        false => serde_json::from_slice(&body).unwrap(),
    };
    (status, body)
}

fn recipe(name: &str, ingredients: &[(Id, i32)], tags: &[Id]) -> Value {
    let ingredients: Vec<Value> = ingredients
        .iter()
        .map(|(id, amount)| json!({"id": id, "amount": amount}))
        .collect();

    json!({
        "ingredients": ingredients,
        "tags": tags,
        "image": "data:image/png;base64,AAAA",
        "name": name,
        "text": "Mix and cook.",
        "cooking_time": 15,
    })
}

async fn create_recipe(pool: &PgPool, author: &User, payload: Value) -> Id {
    let (status, body) =
        send_json(pool, "POST", "/api/recipes", Some(author), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap() as Id
}

const INGREDIENT_LINKS: &str = "SELECT COUNT(*) FROM recipe_ingredients WHERE recipe_id = $1";
const TAG_LINKS: &str = "SELECT COUNT(*) FROM recipe_tags WHERE recipe_id = $1";

#[sqlx::test(migrations = "./migrations")]
async fn recipe_associations_are_replaced_on_update(pool: PgPool) {
    let cook = insert_user(&pool, "cook", UserRole::User).await;
    let salt = insert_ingredient(&pool, "Salt", "g").await;
    let flour = insert_ingredient(&pool, "Flour", "g").await;
    let milk = insert_ingredient(&pool, "Milk", "ml").await;
    let breakfast = insert_tag(&pool, "breakfast", "#E26C2D").await;
    let lunch = insert_tag(&pool, "lunch", "#49B64E").await;
    let dinner = insert_tag(&pool, "dinner", "#8775D2").await;

    let id = create_recipe(
        &pool,
        &cook,
        recipe("Pancakes", &[(salt, 5), (flour, 200), (milk, 300)], &[breakfast, lunch]),
    )
    .await;
    assert_eq!(count(&pool, INGREDIENT_LINKS, id).await, 3);
    assert_eq!(count(&pool, TAG_LINKS, id).await, 2);

    let (status, body) = send_json(
        &pool,
        "PATCH",
        &format!("/api/recipes/{id}"),
        Some(&cook),
        Some(json!({"ingredients": [{"id": flour, "amount": 250}], "tags": [dinner]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Pancakes");
    assert_eq!(body["ingredients"][0]["amount"], 250);
    assert_eq!(body["tags"][0]["slug"], "dinner");

    assert_eq!(count(&pool, INGREDIENT_LINKS, id).await, 1);
    assert_eq!(count(&pool, TAG_LINKS, id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn failed_creation_leaves_no_recipe(pool: PgPool) {
    let cook = insert_user(&pool, "cook", UserRole::User).await;
    let salt = insert_ingredient(&pool, "Salt", "g").await;
    let lunch = insert_tag(&pool, "lunch", "#49B64E").await;

    let (status, _) = send_json(
        &pool,
        "POST",
        "/api/recipes",
        Some(&cook),
        Some(recipe("Soup", &[(salt, 5), (salt + 100, 1)], &[lunch])),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (recipes,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes")
        .fetch_one(&pool)
        .await
        .unwrap();
    let (links,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipe_ingredients")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!((recipes, links), (0, 0));
}

#[sqlx::test(migrations = "./migrations")]
async fn other_authors_cannot_edit(pool: PgPool) {
    let cook = insert_user(&pool, "cook", UserRole::User).await;
    let guest = insert_user(&pool, "guest", UserRole::User).await;
    let admin = insert_user(&pool, "admin", UserRole::Admin).await;
    let salt = insert_ingredient(&pool, "Salt", "g").await;
    let lunch = insert_tag(&pool, "lunch", "#49B64E").await;
    let id = create_recipe(&pool, &cook, recipe("Soup", &[(salt, 5)], &[lunch])).await;

    let path = format!("/api/recipes/{id}");
    let (status, _) = send(&pool, "DELETE", &path, Some(&guest), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&pool, "DELETE", &path, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
async fn favorites_hold_each_recipe_once(pool: PgPool) {
    let cook = insert_user(&pool, "cook", UserRole::User).await;
    let salt = insert_ingredient(&pool, "Salt", "g").await;
    let lunch = insert_tag(&pool, "lunch", "#49B64E").await;
    let id = create_recipe(&pool, &cook, recipe("Soup", &[(salt, 5)], &[lunch])).await;
    let path = format!("/api/recipes/{id}/favorite");

    let (status, body) = send_json(&pool, "POST", &path, Some(&cook), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], id);

    let (status, body) = send_json(&pool, "POST", &path, Some(&cook), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].is_string());

    let (status, body) =
        send_json(&pool, "GET", "/api/recipes?is_favorited=1", Some(&cook), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["is_favorited"], true);

    let (_, body) =
        send_json(&pool, "GET", "/api/recipes?is_favorited=0", Some(&cook), None).await;
    assert_eq!(body["count"], 0);

    let (status, _) = send(&pool, "DELETE", &path, Some(&cook), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&pool, "DELETE", &path, Some(&cook), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn subscriptions_are_unique_and_never_to_self(pool: PgPool) {
    let cook = insert_user(&pool, "cook", UserRole::User).await;
    let reader = insert_user(&pool, "reader", UserRole::User).await;
    let path = format!("/api/users/{}/subscribe", cook.id);

    let (status, body) = send_json(&pool, "POST", &path, Some(&reader), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_subscribed"], true);

    let (status, _) = send(&pool, "POST", &path, Some(&reader), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&pool, "POST", &path, Some(&cook), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) =
        send_json(&pool, "GET", "/api/users/subscriptions", Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, _) = send(&pool, "DELETE", &path, Some(&reader), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&pool, "DELETE", &path, Some(&reader), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn shopping_list_sums_the_cart(pool: PgPool) {
    let cook = insert_user(&pool, "cook", UserRole::User).await;
    let salt = insert_ingredient(&pool, "Salt", "g").await;
    let flour = insert_ingredient(&pool, "Flour", "g").await;
    let milk = insert_ingredient(&pool, "Milk", "ml").await;
    let lunch = insert_tag(&pool, "lunch", "#49B64E").await;

    let soup = recipe("Soup", &[(salt, 10), (milk, 300)], &[lunch]);
    let soup = create_recipe(&pool, &cook, soup).await;
    let bread = recipe("Bread", &[(salt, 5), (flour, 500)], &[lunch]);
    let bread = create_recipe(&pool, &cook, bread).await;
    create_recipe(&pool, &cook, recipe("Porridge", &[(milk, 200)], &[lunch])).await;

    for id in [soup, bread] {
        let path = format!("/api/recipes/{id}/shopping_cart");
        let (status, _) = send(&pool, "POST", &path, Some(&cook), None).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &pool,
        "GET",
        "/api/recipes/download_shopping_cart",
        Some(&cook),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "Shopping list\nFlour - 500 (g)\nMilk - 300 (ml)\nSalt - 15 (g)\n"
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn tag_filter_matches_any_tag(pool: PgPool) {
    let cook = insert_user(&pool, "cook", UserRole::User).await;
    let salt = insert_ingredient(&pool, "Salt", "g").await;
    let breakfast = insert_tag(&pool, "breakfast", "#E26C2D").await;
    let lunch = insert_tag(&pool, "lunch", "#49B64E").await;
    let dinner = insert_tag(&pool, "dinner", "#8775D2").await;

    create_recipe(&pool, &cook, recipe("Eggs", &[(salt, 1)], &[breakfast])).await;
    create_recipe(&pool, &cook, recipe("Soup", &[(salt, 5)], &[lunch, dinner])).await;
    create_recipe(&pool, &cook, recipe("Steak", &[(salt, 3)], &[dinner])).await;

    let path = "/api/recipes?tags=breakfast&tags=lunch";
    let (_, body) = send_json(&pool, "GET", path, None, None).await;
    assert_eq!(body["count"], 2);

    let (_, body) = send_json(&pool, "GET", "/api/recipes?tags=dinner", None, None).await;
    let names: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|recipe| recipe["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Steak", "Soup"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn pages_past_the_end_keep_the_total(pool: PgPool) {
    let cook = insert_user(&pool, "cook", UserRole::User).await;
    insert_user(&pool, "reader", UserRole::User).await;
    let salt = insert_ingredient(&pool, "Salt", "g").await;
    let lunch = insert_tag(&pool, "lunch", "#49B64E").await;
    create_recipe(&pool, &cook, recipe("Soup", &[(salt, 5)], &[lunch])).await;
    create_recipe(&pool, &cook, recipe("Stew", &[(salt, 5)], &[lunch])).await;

    let (_, body) = send_json(&pool, "GET", "/api/users?offset=10", None, None).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["next_offset"], Value::Null);

    let (_, body) = send_json(&pool, "GET", "/api/recipes?offset=5&limit=2", None, None).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["prev_offset"], 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn ingredient_search_is_a_prefix_match(pool: PgPool) {
    insert_ingredient(&pool, "Salt", "g").await;
    insert_ingredient(&pool, "Salmon", "g").await;
    insert_ingredient(&pool, "Sea salt", "g").await;

    let (status, body) = send_json(&pool, "GET", "/api/ingredients?name=Sal", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|ingredient| ingredient["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Salmon", "Salt"]);
}
