//! Recipe models for the API service

use common::error::FieldErrors;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::catalog::{CatalogItem, CatalogKind, NamedRef, validate_name};

/// Stored recipe row
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub description: String,
    pub link: String,
    pub image: Option<String>,
}

/// Abbreviated representation used by the list endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<CatalogItem>,
}

/// Full representation used by the detail endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub description: String,
    pub tags: Vec<CatalogItem>,
    pub ingredients: Vec<CatalogItem>,
    pub image: Option<String>,
}

impl RecipeDetail {
    pub fn new(row: RecipeRow, tags: Vec<CatalogItem>, ingredients: Vec<CatalogItem>) -> Self {
        Self {
            id: row.id,
            title: row.title,
            time_minutes: row.time_minutes,
            price: row.price,
            link: row.link,
            description: row.description,
            tags,
            ingredients,
            image: row.image,
        }
    }
}

/// Response for the image upload endpoint
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RecipeImage {
    pub id: i64,
    pub image: Option<String>,
}

/// Query parameters for recipe listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeQuery {
    /// Comma separated list of tag IDs
    pub tags: Option<String>,
    /// Comma separated list of ingredient IDs
    pub ingredients: Option<String>,
}

/// Parsed recipe list filters
///
/// A recipe matches when it is linked to any of the given tags (if set)
/// and to any of the given ingredients (if set).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

impl RecipeQuery {
    pub fn into_filter(self) -> Result<RecipeFilter, FieldErrors> {
        let mut errors = FieldErrors::new();

        let tags = parse_id_list(self.tags.as_deref()).unwrap_or_else(|msg| {
            errors.add("tags", msg);
            None
        });
        let ingredients = parse_id_list(self.ingredients.as_deref()).unwrap_or_else(|msg| {
            errors.add("ingredients", msg);
            None
        });

        errors.into_result(RecipeFilter { tags, ingredients })
    }
}

/// Parse a comma separated list of integer IDs; empty input means no filter
pub fn parse_id_list(raw: Option<&str>) -> Result<Option<Vec<i64>>, String> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(None),
    };

    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| format!("'{}' is not a valid integer ID", part))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Recipe create/update request body
///
/// Unknown keys such as `user` or `id` are ignored, so ownership can never
/// be reassigned through a write.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePayload {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub tags: Option<Vec<NamedRef>>,
    pub ingredients: Option<Vec<NamedRef>>,
}

/// Validated recipe for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub description: String,
    pub link: String,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
}

/// Validated recipe update; `None` leaves a field untouched
///
/// `tags`/`ingredients` set to `Some` replace the whole relation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}

impl RecipePayload {
    /// Validate a create request
    pub fn into_new_recipe(self) -> Result<NewRecipe, FieldErrors> {
        let changes = self.validate(false)?;

        match (changes.title, changes.time_minutes, changes.price) {
            (Some(title), Some(time_minutes), Some(price)) => Ok(NewRecipe {
                title,
                time_minutes,
                price,
                description: changes.description.unwrap_or_default(),
                link: changes.link.unwrap_or_default(),
                tags: changes.tags.unwrap_or_default(),
                ingredients: changes.ingredients.unwrap_or_default(),
            }),
            // validate(false) already reported the missing fields
            _ => Err(FieldErrors::single("title", "This field is required.")),
        }
    }

    /// Validate an update request; `partial` is true for `PATCH`
    pub fn validate(self, partial: bool) -> Result<RecipeChanges, FieldErrors> {
        let mut errors = FieldErrors::new();

        if !partial {
            if self.title.is_none() {
                errors.add("title", "This field is required.");
            }
            if self.time_minutes.is_none() {
                errors.add("time_minutes", "This field is required.");
            }
            if self.price.is_none() {
                errors.add("price", "This field is required.");
            }
        }

        if let Some(title) = &self.title {
            if let Err(msg) = validate_name(title) {
                errors.add("title", msg);
            }
        }

        if let Some(minutes) = self.time_minutes {
            if minutes < 0 {
                errors.add("time_minutes", "Ensure this value is greater than or equal to 0.");
            }
        }

        if let Some(price) = self.price {
            if let Err(msg) = validate_price(price) {
                errors.add("price", msg);
            }
        }

        if let Some(link) = &self.link {
            if link.chars().count() > 255 {
                errors.add("link", "Ensure this field has no more than 255 characters.");
            }
        }

        let tags = self
            .tags
            .map(|refs| collect_names(CatalogKind::Tag, refs, &mut errors));
        let ingredients = self
            .ingredients
            .map(|refs| collect_names(CatalogKind::Ingredient, refs, &mut errors));

        errors.into_result(RecipeChanges {
            title: self.title,
            time_minutes: self.time_minutes,
            price: self.price,
            description: self.description,
            link: self.link,
            tags,
            ingredients,
        })
    }
}

fn collect_names(kind: CatalogKind, refs: Vec<NamedRef>, errors: &mut FieldErrors) -> Vec<String> {
    refs.into_iter()
        .map(|item| {
            if let Err(msg) = validate_name(&item.name) {
                errors.add(kind.field(), format!("name: {}", msg));
            }
            item.name
        })
        .collect()
}

/// Prices are non-negative with at most five digits, two of them decimal
pub fn validate_price(price: Decimal) -> Result<(), String> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }

    if price.scale() > 2 {
        return Err("Ensure that there are no more than 2 decimal places.".to_string());
    }

    if price.trunc() >= Decimal::from(1000) {
        return Err("Ensure that there are no more than 5 digits in total.".to_string());
    }

    Ok(())
}
