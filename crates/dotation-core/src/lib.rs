//! Dotation Core Library
//!
//! Local-first supply replenishment for care-facility services: staff declare
//! what is left on the shelves, the library computes what to bring, tracks
//! preparation and logs what was delivered.
//!
//! # Architecture
//!
//! ```text
//! products.json ─┐
//! services.json ─┼─▶ Catalog ──▶ Entry sheet (remainders)
//! dotations.json ┤                     │
//! order.json ────┘               need = target − remainder
//!                                      │
//!                                Prep worklist ──▶ prepared / done
//!                                      │
//!                                Close service ──▶ Consumption log
//!                                                        │
//!                                         ┌──────────────┼──────────────┐
//!                                         ▼              ▼              ▼
//!                                    Week/month      By product       CSV
//!                                      report        / service       export
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite key-value store holding JSON records
//! - [`models`]: Domain types (Product, Service, Remainder, ConsumptionEvent)
//! - [`units`]: Carton/pack/unit conversions and input normalization
//! - [`loader`]: Catalog document loading
//! - [`workflow`]: Per-service preparation state machine
//! - [`ledger`]: Consumption log, reports and CSV export
//! - [`session`]: Application state tying the store to a catalog

pub mod db;
pub mod ledger;
pub mod loader;
pub mod models;
pub mod session;
pub mod units;
pub mod workflow;

// Re-export commonly used types
pub use db::Database;
pub use ledger::{CloseOutcome, ConsumptionReport, Ledger, Period, PeriodKind};
pub use loader::{load_catalog, CatalogSource, DirectorySource, MemorySource};
pub use models::{
    Catalog, ConsumptionEvent, ItemState, Product, Remainder, RemainderField, Service,
    ServiceWorkflow, UnitTier,
};
pub use session::{CatalogSummary, Session};
pub use workflow::{Preparation, Worklist};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DotationError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for DotationError {
    fn from(e: db::DbError) -> Self {
        DotationError::DatabaseError(e.to_string())
    }
}

impl From<workflow::WorkflowError> for DotationError {
    fn from(e: workflow::WorkflowError) -> Self {
        match e {
            workflow::WorkflowError::Database(db) => db.into(),
            workflow::WorkflowError::UnknownService(_) | workflow::WorkflowError::UnknownProduct(_) => {
                DotationError::NotFound(e.to_string())
            }
            workflow::WorkflowError::NotInDotation { .. } => DotationError::InvalidInput(e.to_string()),
        }
    }
}

impl From<loader::CatalogError> for DotationError {
    fn from(e: loader::CatalogError) -> Self {
        DotationError::CatalogError(e.to_string())
    }
}

impl From<serde_json::Error> for DotationError {
    fn from(e: serde_json::Error) -> Self {
        DotationError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for DotationError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DotationError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<DotationCore>, DotationError> {
    let session = Session::open(&path)?;
    Ok(Arc::new(DotationCore {
        session: Arc::new(Mutex::new(session)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<DotationCore>, DotationError> {
    let session = Session::new(Database::open_in_memory()?);
    Ok(Arc::new(DotationCore {
        session: Arc::new(Mutex::new(session)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe session wrapper for FFI.
#[derive(uniffi::Object)]
pub struct DotationCore {
    session: Arc<Mutex<Session>>,
}

#[uniffi::export]
impl DotationCore {
    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Reload the catalog from a directory holding the four JSON files.
    ///
    /// Returns the status line; on error the previous catalog is kept.
    pub fn reload_catalog_from_dir(&self, dir: String) -> Result<String, DotationError> {
        let mut session = self.session.lock()?;
        session.reload_catalog(&DirectorySource::new(dir))?;
        Ok(session.status().to_string())
    }

    /// Reload the catalog from documents fetched by the host application.
    pub fn reload_catalog_from_documents(
        &self,
        products: String,
        services: String,
        dotations: String,
        ordering: String,
    ) -> Result<String, DotationError> {
        let source = MemorySource::new()
            .with(loader::PRODUCTS_FILE, products)
            .with(loader::SERVICES_FILE, services)
            .with(loader::DOTATIONS_FILE, dotations)
            .with(loader::ORDERING_FILE, ordering);
        let mut session = self.session.lock()?;
        session.reload_catalog(&source)?;
        Ok(session.status().to_string())
    }

    /// Status line of the last catalog load.
    pub fn catalog_status(&self) -> Result<String, DotationError> {
        let session = self.session.lock()?;
        Ok(session.status().to_string())
    }

    /// Products sorted by category, then code.
    pub fn products(&self) -> Result<Vec<FfiProduct>, DotationError> {
        let session = self.session.lock()?;
        Ok(session
            .catalog()
            .products_for_display()
            .into_iter()
            .map(|p| p.clone().into())
            .collect())
    }

    /// Services sorted by name.
    pub fn services(&self) -> Result<Vec<FfiService>, DotationError> {
        let session = self.session.lock()?;
        Ok(session.catalog().services().iter().cloned().map(Into::into).collect())
    }

    /// Dotation targets of a service.
    pub fn dotation_sheet(&self, service_id: String) -> Result<Vec<FfiDotationLine>, DotationError> {
        let session = self.session.lock()?;
        let lines = session.preparation().dotation_sheet(&service_id)?;
        Ok(lines.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Workflow Operations
    // =========================================================================

    /// Remainder entry sheet of a service.
    pub fn entry_sheet(&self, service_id: String) -> Result<Vec<FfiEntryLine>, DotationError> {
        let session = self.session.lock()?;
        let lines = session.preparation().entry_sheet(&service_id)?;
        Ok(lines.into_iter().map(Into::into).collect())
    }

    /// Declare a remainder through an explicit field ("packs" or "units").
    pub fn declare_remainder(
        &self,
        service_id: String,
        code: String,
        field: String,
        input: String,
    ) -> Result<FfiEntryUpdate, DotationError> {
        let field = parse_field(&field)?;
        let session = self.session.lock()?;
        let update = session
            .preparation()
            .declare_remainder(&service_id, &code, field, &input)?;
        Ok(update.into())
    }

    /// Declare a remainder through the field the product accepts.
    pub fn declare(
        &self,
        service_id: String,
        code: String,
        input: String,
    ) -> Result<FfiEntryUpdate, DotationError> {
        let session = self.session.lock()?;
        let update = session.preparation().declare(&service_id, &code, &input)?;
        Ok(update.into())
    }

    /// Record a prepared amount; returns the stored (capped) value, if any.
    pub fn set_prepared(
        &self,
        service_id: String,
        code: String,
        input: String,
    ) -> Result<Option<u64>, DotationError> {
        let session = self.session.lock()?;
        Ok(session.preparation().set_prepared(&service_id, &code, &input)?)
    }

    /// Check or uncheck an item.
    pub fn set_done(
        &self,
        service_id: String,
        code: String,
        checked: bool,
    ) -> Result<FfiItemState, DotationError> {
        let session = self.session.lock()?;
        let state = session.preparation().set_done(&service_id, &code, checked)?;
        Ok(state.into())
    }

    pub fn check_all(&self, service_id: String) -> Result<u32, DotationError> {
        let session = self.session.lock()?;
        Ok(session.preparation().check_all(&service_id)? as u32)
    }

    pub fn uncheck_all(&self, service_id: String) -> Result<u32, DotationError> {
        let session = self.session.lock()?;
        Ok(session.preparation().uncheck_all(&service_id)? as u32)
    }

    /// Preparation worklist of a service.
    pub fn worklist(&self, service_id: String) -> Result<FfiWorklist, DotationError> {
        let session = self.session.lock()?;
        let worklist = session.preparation().worklist(&service_id)?;
        Ok(worklist.into())
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Close a service, logging prepared amounts when `with_save` is set.
    pub fn close_service(
        &self,
        service_id: String,
        with_save: bool,
    ) -> Result<FfiCloseOutcome, DotationError> {
        let session = self.session.lock()?;
        Ok(session.close_service(&service_id, with_save)?.into())
    }

    /// Discard a service's workflow without logging. Callers confirm first.
    pub fn clear_service(&self, service_id: String) -> Result<FfiCloseOutcome, DotationError> {
        self.close_service(service_id, false)
    }

    /// Consumption over the week or month containing `date` (YYYY-MM-DD).
    pub fn consumption_report(
        &self,
        mode: String,
        date: String,
    ) -> Result<FfiConsumptionReport, DotationError> {
        let period = parse_period(&mode, &date)?;
        let session = self.session.lock()?;
        let report = session.ledger().report(period, &Local)?;
        Ok(report.into())
    }

    /// The whole consumption log as CSV, dates in local time.
    pub fn export_csv(&self) -> Result<String, DotationError> {
        let session = self.session.lock()?;
        Ok(session.ledger().export_csv(&Local)?)
    }

    /// Consumption report as JSON.
    pub fn consumption_report_json(&self, mode: String, date: String) -> Result<String, DotationError> {
        let period = parse_period(&mode, &date)?;
        let session = self.session.lock()?;
        let report = session.ledger().report(period, &Local)?;
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// Wipe the consumption log. Callers confirm first.
    pub fn clear_consumption_log(&self) -> Result<(), DotationError> {
        let session = self.session.lock()?;
        session.ledger().clear_all()?;
        Ok(())
    }
}

fn parse_period(mode: &str, date: &str) -> Result<Period, DotationError> {
    let kind: PeriodKind = mode.parse().map_err(DotationError::InvalidInput)?;
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| DotationError::InvalidInput(format!("{}: {}", date, e)))?;
    Ok(Period::containing(kind, date))
}

fn parse_field(field: &str) -> Result<RemainderField, DotationError> {
    match field.trim().to_lowercase().as_str() {
        "packs" | "pack" => Ok(RemainderField::Packs),
        "units" | "unit" => Ok(RemainderField::Units),
        other => Err(DotationError::InvalidInput(format!("unknown field: {}", other))),
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe product.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProduct {
    pub code: String,
    pub name: String,
    pub category: String,
    pub units_per_carton: u64,
    pub units_per_pack: u64,
}

impl From<Product> for FfiProduct {
    fn from(product: Product) -> Self {
        Self {
            category: product.tier.label().to_string(),
            code: product.code,
            name: product.name,
            units_per_carton: product.units_per_carton,
            units_per_pack: product.units_per_pack,
        }
    }
}

/// FFI-safe service.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiService {
    pub id: String,
    pub name: String,
}

impl From<Service> for FfiService {
    fn from(service: Service) -> Self {
        Self {
            id: service.id,
            name: service.name,
        }
    }
}

/// FFI-safe dotation sheet row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDotationLine {
    pub index: u32,
    pub code: String,
    pub name: String,
    pub target: u64,
    pub equivalent: String,
}

impl From<workflow::DotationLine> for FfiDotationLine {
    fn from(line: workflow::DotationLine) -> Self {
        Self {
            index: line.index as u32,
            equivalent: line.equivalent.to_string(),
            code: line.code,
            name: line.name,
            target: line.target,
        }
    }
}

/// FFI-safe entry sheet row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiEntryLine {
    pub index: u32,
    pub code: String,
    pub name: String,
    pub target: u64,
    /// "packs" or "units"
    pub field: String,
    pub remainder: Option<u64>,
    pub need: u64,
}

impl From<workflow::EntryLine> for FfiEntryLine {
    fn from(line: workflow::EntryLine) -> Self {
        Self {
            index: line.index as u32,
            field: field_name(line.field).to_string(),
            remainder: line.remainder.count(),
            code: line.code,
            name: line.name,
            target: line.target,
            need: line.need,
        }
    }
}

fn field_name(field: RemainderField) -> &'static str {
    match field {
        RemainderField::Packs => "packs",
        RemainderField::Units => "units",
    }
}

/// FFI-safe result of a remainder entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiEntryUpdate {
    pub remainder: Option<u64>,
    pub need: u64,
    pub ignored: bool,
}

impl From<workflow::EntryUpdate> for FfiEntryUpdate {
    fn from(update: workflow::EntryUpdate) -> Self {
        Self {
            remainder: update.remainder.count(),
            need: update.need,
            ignored: update.ignored,
        }
    }
}

/// FFI-safe item state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiItemState {
    Undeclared,
    Declared,
    InProgress,
    Done,
}

impl From<ItemState> for FfiItemState {
    fn from(state: ItemState) -> Self {
        match state {
            ItemState::Undeclared => FfiItemState::Undeclared,
            ItemState::Declared => FfiItemState::Declared,
            ItemState::InProgress => FfiItemState::InProgress,
            ItemState::Done => FfiItemState::Done,
        }
    }
}

/// FFI-safe worklist row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrepLine {
    pub code: String,
    pub name: String,
    pub need: u64,
    /// e.g. "(2 cartons + 1 pack)", empty when nothing fits
    pub hint: String,
    pub prepared: Option<u64>,
    pub done: bool,
}

impl From<workflow::PrepLine> for FfiPrepLine {
    fn from(line: workflow::PrepLine) -> Self {
        let hint = if line.hint.is_empty() {
            String::new()
        } else {
            line.hint.to_string()
        };
        Self {
            code: line.code,
            name: line.name,
            need: line.need,
            hint,
            prepared: line.prepared,
            done: line.done,
        }
    }
}

/// FFI-safe worklist.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiWorklist {
    pub service_id: String,
    pub service_name: String,
    pub summary: String,
    pub lines: Vec<FfiPrepLine>,
}

impl From<Worklist> for FfiWorklist {
    fn from(worklist: Worklist) -> Self {
        Self {
            summary: worklist.summary().to_string(),
            service_id: worklist.service_id,
            service_name: worklist.service_name,
            lines: worklist.lines.into_iter().map(Into::into).collect(),
        }
    }
}

/// FFI-safe close result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCloseOutcome {
    pub logged: u32,
    pub cleared: bool,
}

impl From<CloseOutcome> for FfiCloseOutcome {
    fn from(outcome: CloseOutcome) -> Self {
        Self {
            logged: outcome.logged as u32,
            cleared: outcome.cleared,
        }
    }
}

/// FFI-safe report row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReportLine {
    pub key: String,
    pub name: String,
    pub total: u64,
}

impl From<ledger::ReportLine> for FfiReportLine {
    fn from(line: ledger::ReportLine) -> Self {
        Self {
            key: line.key,
            name: line.name,
            total: line.total,
        }
    }
}

/// FFI-safe consumption report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConsumptionReport {
    pub label: String,
    pub entry_count: u32,
    pub by_product: Vec<FfiReportLine>,
    pub by_service: Vec<FfiReportLine>,
}

impl From<ConsumptionReport> for FfiConsumptionReport {
    fn from(report: ConsumptionReport) -> Self {
        Self {
            label: report.label,
            entry_count: report.entry_count as u32,
            by_product: report.by_product.into_iter().map(Into::into).collect(),
            by_service: report.by_service.into_iter().map(Into::into).collect(),
        }
    }
}
