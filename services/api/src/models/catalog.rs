//! Tag and ingredient models
//!
//! Tags and ingredients have the same shape and the same ownership rules,
//! so both are represented by `CatalogItem` and told apart by `CatalogKind`.

use common::error::FieldErrors;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maximum length of a tag or ingredient name
pub const MAX_NAME_LENGTH: usize = 255;

/// Which catalog a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Tag,
    Ingredient,
}

impl CatalogKind {
    /// Table holding the entries
    pub fn table(self) -> &'static str {
        match self {
            CatalogKind::Tag => "tags",
            CatalogKind::Ingredient => "ingredients",
        }
    }

    /// Join table linking entries to recipes
    pub fn link_table(self) -> &'static str {
        match self {
            CatalogKind::Tag => "recipe_tags",
            CatalogKind::Ingredient => "recipe_ingredients",
        }
    }

    /// Column in the join table referencing the entry
    pub fn link_column(self) -> &'static str {
        match self {
            CatalogKind::Tag => "tag_id",
            CatalogKind::Ingredient => "ingredient_id",
        }
    }

    /// Request field carrying nested entries in recipe payloads
    pub fn field(self) -> &'static str {
        match self {
            CatalogKind::Tag => "tags",
            CatalogKind::Ingredient => "ingredients",
        }
    }
}

/// A tag or ingredient as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
}

/// Nested `{name}` reference inside recipe writes
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

/// Query parameters for catalog listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    /// `1` keeps only entries linked to at least one recipe
    pub assigned_only: Option<String>,
}

impl CatalogQuery {
    /// Interpret `assigned_only` as an integer flag; absent means off
    pub fn assigned_only(&self) -> Result<bool, FieldErrors> {
        match self.assigned_only.as_deref().map(str::trim) {
            None | Some("") => Ok(false),
            Some(raw) => raw.parse::<i64>().map(|flag| flag != 0).map_err(|_| {
                FieldErrors::single("assigned_only", "A valid integer is required.")
            }),
        }
    }
}

/// Request body for updating a tag or ingredient
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogUpdateRequest {
    pub name: Option<String>,
}

impl CatalogUpdateRequest {
    /// Validated new name; `None` keeps the stored one
    pub fn validate(self, partial: bool) -> Result<Option<String>, FieldErrors> {
        match self.name {
            None if partial => Ok(None),
            None => Err(FieldErrors::single("name", "This field is required.")),
            Some(name) => validate_name(&name)
                .map(|_| Some(name))
                .map_err(|msg| FieldErrors::single("name", msg)),
        }
    }
}

/// Check a tag or ingredient name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("This field may not be blank.".to_string());
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "Ensure this field has no more than {} characters.",
            MAX_NAME_LENGTH
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(raw: Option<&str>) -> CatalogQuery {
        CatalogQuery {
            assigned_only: raw.map(str::to_string),
        }
    }

    #[test]
    fn test_assigned_only_flag() {
        assert_eq!(query(None).assigned_only(), Ok(false));
        assert_eq!(query(Some("")).assigned_only(), Ok(false));
        assert_eq!(query(Some("0")).assigned_only(), Ok(false));
        assert_eq!(query(Some("1")).assigned_only(), Ok(true));
        assert_eq!(query(Some("2")).assigned_only(), Ok(true));
        assert!(query(Some("yes")).assigned_only().is_err());
    }

    #[test]
    fn test_update_requires_name_unless_partial() {
        let empty = || CatalogUpdateRequest { name: None };

        assert_eq!(empty().validate(true), Ok(None));
        assert!(empty().validate(false).unwrap_err().contains("name"));

        let renamed = CatalogUpdateRequest {
            name: Some("Updated_Ingredient".to_string()),
        };
        assert_eq!(
            renamed.validate(false),
            Ok(Some("Updated_Ingredient".to_string()))
        );
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Vegan").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"a".repeat(256)).is_err());
    }

    #[test]
    fn test_kind_tables() {
        assert_eq!(CatalogKind::Tag.table(), "tags");
        assert_eq!(CatalogKind::Ingredient.link_table(), "recipe_ingredients");
        assert_eq!(CatalogKind::Ingredient.link_column(), "ingredient_id");
    }
}
