//! Unit tests for loading catalogs from disk

use bidplus_fetcher::catalog::{CatalogError, CategoryCatalog};
use std::io::Write;
use tempfile::NamedTempFile;

fn catalog_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_from_json_file() {
    let file = catalog_file(
        r#"[
            {"category_name": "Cloud Service", "category_id": "home_clou"},
            {"category_name": "Laptop", "category_id": "computers_laptop"}
        ]"#,
    );

    let catalog = CategoryCatalog::from_json_file(file.path()).unwrap();

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.categories()[1].name, "Laptop");
    assert_eq!(
        catalog.get("home_clou").map(|c| c.name.as_str()),
        Some("Cloud Service")
    );
}

#[test]
fn test_missing_file() {
    let result = CategoryCatalog::from_json_file("/nonexistent/catalog.json");
    assert!(matches!(result, Err(CatalogError::IoError(_))));
}

#[test]
fn test_duplicate_in_file() {
    let file = catalog_file(
        r#"[
            {"category_name": "A", "category_id": "same"},
            {"category_name": "B", "category_id": "same"}
        ]"#,
    );

    let result = CategoryCatalog::from_json_file(file.path());
    assert!(matches!(result, Err(CatalogError::DuplicateIdentifier(_))));
}

#[test]
fn test_builtin_identifiers_are_unique_and_non_blank() {
    let catalog = CategoryCatalog::builtin().unwrap();

    // Re-validating the built-in table through the public constructor must pass
    let rebuilt = CategoryCatalog::new(catalog.categories().to_vec()).unwrap();
    assert_eq!(rebuilt, catalog);
}
