use std::collections::HashSet;

use serde::Serialize;

use super::schema::{Id, Recipe, RecipePart, ShortRecipe, Tag, User};

/// Who is looking at a representation, together with their memberships among
/// the rows being rendered. Flags are derived from this and never from
/// request-global state.
#[derive(Debug, Clone, Default)]
pub struct ViewerContext {
    viewer: Option<Id>,
    favorites: HashSet<Id>,
    shopping_cart: HashSet<Id>,
    subscriptions: HashSet<Id>,
}

impl ViewerContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(
        viewer: Id,
        favorites: HashSet<Id>,
        shopping_cart: HashSet<Id>,
        subscriptions: HashSet<Id>,
    ) -> Self {
        Self {
            viewer: Some(viewer),
            favorites,
            shopping_cart,
            subscriptions,
        }
    }

    pub fn is_favorited(&self, recipe_id: Id) -> bool {
        self.viewer.is_some() && self.favorites.contains(&recipe_id)
    }

    pub fn is_in_shopping_cart(&self, recipe_id: Id) -> bool {
        self.viewer.is_some() && self.shopping_cart.contains(&recipe_id)
    }

    /// Always false for anonymous viewers and for the viewer's own profile.
    pub fn is_subscribed(&self, author_id: Id) -> bool {
        match self.viewer {
            Some(viewer) if viewer != author_id => self.subscriptions.contains(&author_id),
            _ => false,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub email: String,
    pub id: Id,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserView {
    pub fn new(user: &User, context: &ViewerContext) -> Self {
        Self {
            email: user.email.to_owned(),
            id: user.id,
            username: user.username.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            is_subscribed: context.is_subscribed(user.id),
        }
    }
}

/// Registration response; carries no viewer-relative fields.
#[derive(Serialize, Debug, Clone)]
pub struct CreatedUser {
    pub email: String,
    pub id: Id,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for CreatedUser {
    fn from(value: User) -> Self {
        Self {
            email: value.email,
            id: value.id,
            username: value.username,
            first_name: value.first_name,
            last_name: value.last_name,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeIngredientView {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipePart> for RecipeIngredientView {
    fn from(value: RecipePart) -> Self {
        Self {
            id: value.ingredient_id,
            name: value.name,
            measurement_unit: value.measurement_unit,
            amount: value.amount,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct RecipeView {
    pub id: Id,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

impl RecipeView {
    pub fn new(
        recipe: Recipe,
        tags: Vec<Tag>,
        ingredients: Vec<RecipePart>,
        author: &User,
        context: &ViewerContext,
    ) -> Self {
        Self {
            id: recipe.id,
            tags,
            author: UserView::new(author, context),
            ingredients: ingredients.into_iter().map(Into::into).collect(),
            is_favorited: context.is_favorited(recipe.id),
            is_in_shopping_cart: context.is_in_shopping_cart(recipe.id),
            name: recipe.name,
            image: recipe.image,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        }
    }
}

impl From<Recipe> for ShortRecipe {
    fn from(value: Recipe) -> Self {
        Self {
            id: value.id,
            name: value.name,
            image: value.image,
            cooking_time: value.cooking_time,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub author: UserView,
    pub recipes: Vec<ShortRecipe>,
    pub recipes_count: i64,
}
