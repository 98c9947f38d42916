//! Catalog loading from the four static JSON documents.
//!
//! Loading is all-or-nothing: if any document is missing or unparsable no
//! catalog is produced, so callers keep whatever they loaded before.

mod parse;
mod source;

pub use parse::*;
pub use source::*;

use serde_json::Value;
use thiserror::Error;

use crate::models::Catalog;

pub const PRODUCTS_FILE: &str = "products.json";
pub const SERVICES_FILE: &str = "services.json";
pub const DOTATIONS_FILE: &str = "dotations.json";
pub const ORDERING_FILE: &str = "dotations_order.json";

/// Catalog loading errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{0} not found")]
    Missing(String),

    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

fn fetch_json(source: &dyn CatalogSource, file: &str) -> CatalogResult<Value> {
    let raw = source.fetch(file)?;
    serde_json::from_str(&raw).map_err(|e| CatalogError::Parse {
        file: file.to_string(),
        source: e,
    })
}

/// Fetch and normalize all four documents into a fresh catalog.
pub fn load_catalog(source: &dyn CatalogSource) -> CatalogResult<Catalog> {
    let products = fetch_json(source, PRODUCTS_FILE)?;
    let services = fetch_json(source, SERVICES_FILE)?;
    let dotations = fetch_json(source, DOTATIONS_FILE)?;
    let ordering = fetch_json(source, ORDERING_FILE)?;

    let catalog = Catalog::new(
        parse_products(&products),
        parse_services(&services),
        parse_dotations(&dotations),
        parse_ordering(&ordering),
    );

    tracing::info!(
        source = %source.describe(),
        products = catalog.products().len(),
        services = catalog.services().len(),
        "catalog loaded"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_source() -> MemorySource {
        MemorySource::new()
            .with(
                PRODUCTS_FILE,
                r#"[{"code":"P","name":"Papier","category":"Pack","unitsPerCarton":0,"unitsPerPack":10}]"#,
            )
            .with(SERVICES_FILE, r#"[{"id":"s1","name":"Pédiatrie"}]"#)
            .with(DOTATIONS_FILE, r#"{"s1":{"P":50}}"#)
            .with(ORDERING_FILE, r#"{"s1":["P"]}"#)
    }

    #[test]
    fn test_load_catalog() {
        let catalog = load_catalog(&full_source()).unwrap();
        assert_eq!(catalog.products().len(), 1);
        assert_eq!(catalog.service_name("s1"), "Pédiatrie");
        assert_eq!(catalog.target("s1", "P"), 50);
        assert_eq!(catalog.ordered_codes("s1"), vec!["P"]);
    }

    #[test]
    fn test_missing_document_fails() {
        let source = MemorySource::new()
            .with(PRODUCTS_FILE, "[]")
            .with(SERVICES_FILE, "[]")
            .with(DOTATIONS_FILE, "{}");
        let err = load_catalog(&source).unwrap_err();
        assert!(matches!(err, CatalogError::Missing(ref f) if f == ORDERING_FILE));
    }

    #[test]
    fn test_invalid_json_fails() {
        let source = full_source().with(DOTATIONS_FILE, "{oops");
        let err = load_catalog(&source).unwrap_err();
        assert!(err.to_string().starts_with("invalid JSON in dotations.json"));
    }
}
