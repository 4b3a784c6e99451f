//! Category catalog
//!
//! The catalog is the ordered list of portal categories a run walks through.
//! A built-in table is embedded in the binary; a JSON file with the same shape
//! (`[{"category_name": ..., "category_id": ...}]`) can replace it.
//!
//! Catalog order is significant: reports list categories in exactly this order.

use crate::Category;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;

/// Embedded catalog data
const CATALOG_JSON: &str = include_str!("categories.json");

/// Built-in catalog (parsed once)
static BUILTIN: Lazy<Result<CategoryCatalog, CatalogError>> =
    Lazy::new(|| CategoryCatalog::from_json(CATALOG_JSON));

/// Catalog errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("IO error: {0}")]
    IoError(String),

    /// Catalog JSON is malformed
    #[error("parse error: {0}")]
    ParseError(String),

    /// An entry has a blank name or identifier
    #[error("invalid catalog entry at position {position}: {reason}")]
    InvalidEntry {
        /// Zero-based entry position
        position: usize,
        /// What is wrong with the entry
        reason: String,
    },

    /// The same identifier appears twice
    #[error("duplicate category identifier: {0}")]
    DuplicateIdentifier(String),
}

/// Ordered, validated list of categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCatalog {
    categories: Vec<Category>,
}

impl CategoryCatalog {
    /// Build a catalog from categories, rejecting blank or duplicate entries
    pub fn new(categories: Vec<Category>) -> Result<Self, CatalogError> {
        validate(&categories)?;
        Ok(Self { categories })
    }

    /// The catalog shipped with the binary
    pub fn builtin() -> Result<Self, CatalogError> {
        (*BUILTIN).clone()
    }

    /// Parse a catalog from a JSON array
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let categories: Vec<Category> = serde_json::from_str(json)
            .map_err(|e| CatalogError::ParseError(format!("Failed to parse catalog: {e}")))?;
        Self::new(categories)
    }

    /// Load a catalog from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::IoError(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Categories in catalog order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Look up a category by identifier
    pub fn get(&self, identifier: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.identifier == identifier)
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the catalog has no categories
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Reject blank names/identifiers and duplicate identifiers
fn validate(categories: &[Category]) -> Result<(), CatalogError> {
    let mut seen = HashSet::with_capacity(categories.len());

    for (position, category) in categories.iter().enumerate() {
        if category.name.trim().is_empty() {
            return Err(CatalogError::InvalidEntry {
                position,
                reason: "category name is blank".to_string(),
            });
        }
        if category.identifier.trim().is_empty() {
            return Err(CatalogError::InvalidEntry {
                position,
                reason: format!("category '{}' has a blank identifier", category.name),
            });
        }
        if !seen.insert(category.identifier.as_str()) {
            return Err(CatalogError::DuplicateIdentifier(
                category.identifier.clone(),
            ));
        }
    }

    Ok(())
}
