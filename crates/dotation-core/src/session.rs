//! Application state: the database and the current catalog snapshot.

use std::path::Path;

use crate::db::{Database, DbResult};
use crate::ledger::{CloseOutcome, Ledger};
use crate::loader::{load_catalog, CatalogResult, CatalogSource};
use crate::models::Catalog;
use crate::workflow::Preparation;

const STATUS_NOT_LOADED: &str = "Catalogue non chargé";

/// Counts reported after a successful catalog load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSummary {
    pub products: usize,
    pub services: usize,
}

impl CatalogSummary {
    fn of(catalog: &Catalog) -> Self {
        Self {
            products: catalog.products().len(),
            services: catalog.services().len(),
        }
    }

    pub fn status_line(&self) -> String {
        format!("OK ({} produits • {} services)", self.products, self.services)
    }
}

/// Owns the store and the catalog; hands out workflow and ledger managers.
pub struct Session {
    db: Database,
    catalog: Catalog,
    status: String,
}

impl Session {
    /// Start a session with an empty catalog.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            catalog: Catalog::default(),
            status: STATUS_NOT_LOADED.to_string(),
        }
    }

    /// Open the database file and start a session on it.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Replace the catalog from a source.
    ///
    /// On failure the previous catalog stays in place and the status line
    /// carries the error.
    pub fn reload_catalog(&mut self, source: &dyn CatalogSource) -> CatalogResult<CatalogSummary> {
        match load_catalog(source) {
            Ok(catalog) => {
                let summary = CatalogSummary::of(&catalog);
                self.catalog = catalog;
                self.status = summary.status_line();
                Ok(summary)
            }
            Err(e) => {
                tracing::warn!(source = %source.describe(), error = %e, "catalog reload failed");
                self.status = format!("Erreur: {}", e);
                Err(e)
            }
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Last catalog load status.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn preparation(&self) -> Preparation<'_> {
        Preparation::new(&self.db, &self.catalog)
    }

    pub fn ledger(&self) -> Ledger<'_> {
        Ledger::new(&self.db, &self.catalog)
    }

    /// Close a service, stamping logged entries with the current time.
    pub fn close_service(&self, service_id: &str, with_save: bool) -> DbResult<CloseOutcome> {
        let now = chrono::Utc::now().timestamp_millis();
        self.ledger().close(service_id, with_save, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemorySource;

    fn source() -> MemorySource {
        MemorySource::new()
            .with("products.json", r#"[{"code":"A","name":"Gants","unitsPerPack":10}]"#)
            .with("services.json", r#"[{"id":"s1","name":"Bloc"}]"#)
            .with("dotations.json", r#"{"s1":{"A":50}}"#)
            .with("dotations_order.json", r#"{"s1":["A"]}"#)
    }

    #[test]
    fn test_initial_status() {
        let session = Session::new(Database::open_in_memory().unwrap());
        assert!(session.catalog().is_empty());
        assert_eq!(session.status(), STATUS_NOT_LOADED);
    }

    #[test]
    fn test_reload_sets_status() {
        let mut session = Session::new(Database::open_in_memory().unwrap());
        let summary = session.reload_catalog(&source()).unwrap();
        assert_eq!(summary, CatalogSummary { products: 1, services: 1 });
        assert_eq!(session.status(), "OK (1 produits • 1 services)");
    }

    #[test]
    fn test_failed_reload_keeps_previous_catalog() {
        let mut session = Session::new(Database::open_in_memory().unwrap());
        session.reload_catalog(&source()).unwrap();

        let broken = MemorySource::new().with("products.json", "[]");
        assert!(session.reload_catalog(&broken).is_err());
        assert!(session.status().starts_with("Erreur: "));
        assert!(session.catalog().product("A").is_some());
    }

    #[test]
    fn test_close_service_through_session() {
        let mut session = Session::new(Database::open_in_memory().unwrap());
        session.reload_catalog(&source()).unwrap();
        session.preparation().declare("s1", "A", "3").unwrap();
        session.preparation().set_done("s1", "A", true).unwrap();

        let outcome = session.close_service("s1", true).unwrap();
        assert_eq!(outcome.logged, 1);
        assert_eq!(session.db().load_consumption_log().unwrap()[0].qty_u, 20);
    }
}
