use std::collections::BTreeMap;

use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, QueryError},
    jwt::SessionData,
    permissions::ActionType,
    schema::RecipePart,
    SHOPPING_LIST_HEADER,
};

/// Ingredient amounts summed across every recipe in a shopping cart, one entry
/// per (name, measurement unit).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShoppingList {
    items: BTreeMap<(String, String), i64>,
}

impl ShoppingList {
    pub fn from_parts<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = RecipePart>,
    {
        let mut items: BTreeMap<(String, String), i64> = BTreeMap::new();
        for part in parts {
            *items
                .entry((part.name, part.measurement_unit))
                .or_insert(0) += i64::from(part.amount);
        }

        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Name, unit and total, alphabetically by name then unit.
    pub fn items(&self) -> impl Iterator<Item = (&str, &str, i64)> {
        self.items
            .iter()
            .map(|((name, unit), amount)| (name.as_str(), unit.as_str(), *amount))
    }

    pub fn render(&self) -> String {
        let mut text = format!("{SHOPPING_LIST_HEADER}\n");
        for (name, unit, amount) in self.items() {
            text.push_str(&format!("{name} - {amount} ({unit})\n"));
        }
        text
    }
}

pub async fn get_shopping_list(
    pool: &Pool<Postgres>,
    session: &SessionData,
) -> Result<ShoppingList, Error> {
    session.authenticate(ActionType::ManageOwnLists)?;

    let parts: Vec<RecipePart> = sqlx::query_as(
        "
        SELECT ri.recipe_id, ri.ingredient_id, i.name, i.measurement_unit, ri.amount
        FROM shopping_cart c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
    ",
    )
    .bind(session.user_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(ShoppingList::from_parts(parts))
}
