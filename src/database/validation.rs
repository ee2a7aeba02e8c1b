use std::collections::HashSet;

use thiserror::Error;

use crate::{
    error::{ApiError, Error},
    payload::{
        IngredientAmount, IngredientPayload, PasswordPayload, RecipePatch, RecipePayload,
        RegisterPayload, TagPayload,
    },
    schema::Id,
    EMAIL_LENGTH, HEX_LENGTH, IMAGE_MIME_TYPES, LONG_LENGTH, MAX_AMOUNT_VALUE, MIN_AMOUNT_VALUE,
    MIN_PASSWORD_LENGTH, NAME_LENGTH,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Ingredients must not repeat (ingredient {0})")]
    DuplicateIngredient(Id),
    #[error("Tags must not repeat (tag {0})")]
    DuplicateTag(Id),
    #[error("Recipe needs at least one ingredient")]
    NoIngredients,
    #[error("Recipe needs at least one tag")]
    NoTags,
    #[error("Amount of ingredient {id} must be between 1 and 32767")]
    InvalidAmount { id: Id },
    #[error("Cooking time must be between 1 and 32767")]
    InvalidCookingTime,
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),
    #[error("Field '{field}' must be at most {max} characters long")]
    FieldTooLong { field: &'static str, max: usize },
    #[error("Image must be a base64 encoded data URI")]
    InvalidImage,
    #[error("Enter a valid email address")]
    InvalidEmail,
    #[error("Username may contain only letters, digits and @/./+/-/_")]
    InvalidUsername,
    #[error("Password must be at least 8 characters and not entirely numeric")]
    WeakPassword,
    #[error("Color must be a hex value like #E26C2D")]
    InvalidColor,
    #[error("Slug may contain only latin letters, digits, hyphens and underscores")]
    InvalidSlug,
}

impl From<ValidationError> for Error {
    fn from(value: ValidationError) -> Self {
        ApiError::InvalidRequest.new(&value.to_string())
    }
}

pub fn validate_recipe(payload: &RecipePayload) -> Result<(), ValidationError> {
    validate_name(&payload.name)?;
    validate_text(&payload.text)?;
    validate_image(&payload.image)?;
    validate_cooking_time(payload.cooking_time)?;
    validate_associations(&payload.ingredients, &payload.tags)
}

pub fn validate_recipe_patch(patch: &RecipePatch) -> Result<(), ValidationError> {
    if let Some(name) = &patch.name {
        validate_name(name)?;
    }
    if let Some(text) = &patch.text {
        validate_text(text)?;
    }
    if let Some(image) = &patch.image {
        validate_image(image)?;
    }
    if let Some(cooking_time) = patch.cooking_time {
        validate_cooking_time(cooking_time)?;
    }
    validate_associations(&patch.ingredients, &patch.tags)
}

/// Ingredient and tag references of one submission. Every id may appear once.
pub fn validate_associations(
    ingredients: &[IngredientAmount],
    tags: &[Id],
) -> Result<(), ValidationError> {
    if ingredients.is_empty() {
        return Err(ValidationError::NoIngredients);
    }
    if tags.is_empty() {
        return Err(ValidationError::NoTags);
    }

    let mut seen = HashSet::new();
    for ingredient in ingredients {
        if !seen.insert(ingredient.id) {
            return Err(ValidationError::DuplicateIngredient(ingredient.id));
        }
        if !(MIN_AMOUNT_VALUE..=MAX_AMOUNT_VALUE).contains(&ingredient.amount) {
            return Err(ValidationError::InvalidAmount { id: ingredient.id });
        }
    }

    let mut seen = HashSet::new();
    for tag in tags {
        if !seen.insert(*tag) {
            return Err(ValidationError::DuplicateTag(*tag));
        }
    }

    Ok(())
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    validate_length("name", name, LONG_LENGTH)
}

fn validate_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyField("text"));
    }
    Ok(())
}

fn validate_cooking_time(cooking_time: i32) -> Result<(), ValidationError> {
    if !(MIN_AMOUNT_VALUE..=MAX_AMOUNT_VALUE).contains(&cooking_time) {
        return Err(ValidationError::InvalidCookingTime);
    }
    Ok(())
}

fn validate_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::FieldTooLong { field, max });
    }
    Ok(())
}

/// Accepts `data:image/<type>;base64,<payload>`.
pub fn validate_image(image: &str) -> Result<(), ValidationError> {
    let (header, data) = image
        .strip_prefix("data:image/")
        .and_then(|rest| rest.split_once(";base64,"))
        .ok_or(ValidationError::InvalidImage)?;

    if !IMAGE_MIME_TYPES.contains(&header) || data.is_empty() || data.len() % 4 != 0 {
        return Err(ValidationError::InvalidImage);
    }

    let body = data.trim_end_matches('=');
    if data.len() - body.len() > 2 {
        return Err(ValidationError::InvalidImage);
    }
    if !body
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
    {
        return Err(ValidationError::InvalidImage);
    }

    Ok(())
}

pub fn validate_registration(payload: &RegisterPayload) -> Result<(), ValidationError> {
    validate_length("email", &payload.email, EMAIL_LENGTH)?;
    validate_email(&payload.email)?;
    validate_length("username", &payload.username, NAME_LENGTH)?;
    validate_username(&payload.username)?;
    validate_length("first_name", &payload.first_name, NAME_LENGTH)?;
    validate_length("last_name", &payload.last_name, NAME_LENGTH)?;
    validate_password(&payload.password)
}

pub fn validate_password_change(payload: &PasswordPayload) -> Result<(), ValidationError> {
    validate_password(&payload.new_password)
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let (local, domain) = email.split_once('@').ok_or(ValidationError::InvalidEmail)?;

    let valid = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace);

    if !valid {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));

    if !valid {
        return Err(ValidationError::InvalidUsername);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH
        || password.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ValidationError::WeakPassword);
    }
    Ok(())
}

pub fn validate_tag(payload: &TagPayload) -> Result<(), ValidationError> {
    validate_length("name", &payload.name, LONG_LENGTH)?;
    validate_length("slug", &payload.slug, LONG_LENGTH)?;

    if !payload
        .slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidSlug);
    }

    let color = payload.color.strip_prefix('#');
    let valid_color = payload.color.len() == HEX_LENGTH
        && color.is_some_and(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid_color {
        return Err(ValidationError::InvalidColor);
    }

    Ok(())
}

pub fn validate_ingredient(payload: &IngredientPayload) -> Result<(), ValidationError> {
    validate_length("name", &payload.name, LONG_LENGTH)?;
    validate_length("measurement_unit", &payload.measurement_unit, LONG_LENGTH)
}
