use crate::{
    error::TypeError,
    form::QueryParams,
    schema::{Id, Ingredient},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Tag slugs; a recipe matches when it carries any of them.
    pub tags: Vec<String>,
    pub author: Option<Id>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeFilter {
    pub fn from_query(query: &QueryParams) -> Result<Self, TypeError> {
        Ok(Self {
            tags: query.get_all("tags"),
            author: query.get_number("author")?,
            is_favorited: query.get_bool("is_favorited")?,
            is_in_shopping_cart: query.get_bool("is_in_shopping_cart")?,
        })
    }

    /// Membership filters only make sense relative to a known user.
    pub fn requires_viewer(&self) -> bool {
        self.is_favorited.is_some() || self.is_in_shopping_cart.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientFilter {
    pub name: Option<String>,
}

impl IngredientFilter {
    pub fn from_query(query: &QueryParams) -> Self {
        Self {
            name: query.get_str("name").map(str::to_owned),
        }
    }

    /// Names starting with `name`, case-sensitive. No name matches everything.
    pub fn matches(&self, ingredient: &Ingredient) -> bool {
        match &self.name {
            Some(name) => ingredient.name.starts_with(name.as_str()),
            None => true,
        }
    }
}

/// `recipes_limit` of the subscription listing. Malformed or negative values
/// are ignored rather than rejected.
pub fn recipes_limit(query: &QueryParams) -> Option<i64> {
    query
        .get_str("recipes_limit")
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|limit| *limit >= 0)
}
