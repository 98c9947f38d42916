//! Consumption ledger: closing services, queries, reports and export.

mod aggregate;
mod csv;
mod period;

pub use aggregate::*;
pub use csv::*;
pub use period::*;

use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::models::{Catalog, ConsumptionEvent};

/// Result of closing a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOutcome {
    /// Log entries appended
    pub logged: usize,
    /// Whether a workflow record existed and was removed
    pub cleared: bool,
}

/// A total with its display name resolved from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportLine {
    pub key: String,
    pub name: String,
    pub total: u64,
}

/// Consumption over one period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsumptionReport {
    pub period: Period,
    pub label: String,
    pub entry_count: usize,
    pub by_product: Vec<ReportLine>,
    pub by_service: Vec<ReportLine>,
}

impl ConsumptionReport {
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }
}

/// Ledger manager for one catalog snapshot.
pub struct Ledger<'a> {
    db: &'a Database,
    catalog: &'a Catalog,
}

impl<'a> Ledger<'a> {
    pub fn new(db: &'a Database, catalog: &'a Catalog) -> Self {
        Self { db, catalog }
    }

    /// Finalize a service's workflow.
    ///
    /// With `with_save`, every prepared amount above zero is logged at `ts`.
    /// The workflow is cleared in the same transaction either way.
    pub fn close(&self, service_id: &str, with_save: bool, ts: i64) -> DbResult<CloseOutcome> {
        let events: Vec<ConsumptionEvent> = if with_save {
            self.db
                .load_workflow(service_id)?
                .prepared
                .iter()
                .filter(|(_, qty)| **qty > 0)
                .map(|(code, &qty)| ConsumptionEvent::new(ts, service_id, code.as_str(), qty))
                .collect()
        } else {
            Vec::new()
        };

        let cleared = self.db.close_service(service_id, &events)?;
        tracing::info!(service_id, logged = events.len(), cleared, "service closed");
        Ok(CloseOutcome {
            logged: events.len(),
            cleared,
        })
    }

    /// Entries with `from <= ts < to`, in log order.
    pub fn query(&self, from: i64, to: i64) -> DbResult<Vec<ConsumptionEvent>> {
        Ok(self
            .db
            .load_consumption_log()?
            .into_iter()
            .filter(|event| event.ts >= from && event.ts < to)
            .collect())
    }

    /// Aggregated consumption over a period, bounds taken in the given zone.
    pub fn report<Tz: TimeZone>(&self, period: Period, tz: &Tz) -> DbResult<ConsumptionReport> {
        let (from, to) = period.bounds_millis(tz);
        let events = self.query(from, to)?;

        let by_product = aggregate_by_product(&events)
            .into_iter()
            .map(|t| ReportLine {
                name: self
                    .catalog
                    .product(&t.key)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                key: t.key,
                total: t.total,
            })
            .collect();
        let by_service = aggregate_by_service(&events)
            .into_iter()
            .map(|t| ReportLine {
                name: self.catalog.service_name(&t.key).to_string(),
                key: t.key,
                total: t.total,
            })
            .collect();

        Ok(ConsumptionReport {
            period,
            label: period.to_string(),
            entry_count: events.len(),
            by_product,
            by_service,
        })
    }

    /// CSV of the whole log.
    pub fn export_csv<Tz: TimeZone>(&self, tz: &Tz) -> DbResult<String> {
        let events = self.db.load_consumption_log()?;
        Ok(export_csv(&events, self.catalog, tz))
    }

    /// Wipe the log.
    pub fn clear_all(&self) -> DbResult<()> {
        self.db.clear_consumption_log()?;
        tracing::warn!("consumption log cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, Remainder, Service, ServiceWorkflow};
    use chrono::{NaiveDate, Utc};
    use std::collections::HashMap;

    const DAY: i64 = 86_400_000;

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                Product::new("A".into(), "Gants".into()),
                Product::new("B".into(), "Savon".into()),
            ],
            vec![Service::new("s1", "Bloc")],
            HashMap::new(),
            HashMap::new(),
        )
    }

    fn seeded_workflow(db: &Database) {
        let mut wf = ServiceWorkflow::default();
        wf.set_remainder("A", Remainder::Units(0));
        wf.set_remainder("B", Remainder::Units(0));
        wf.prepared.insert("A".into(), 12);
        wf.prepared.insert("B".into(), 0);
        db.save_workflow("s1", &wf).unwrap();
    }

    #[test]
    fn test_close_with_save_logs_positive_amounts() {
        let db = Database::open_in_memory().unwrap();
        let catalog = catalog();
        let ledger = Ledger::new(&db, &catalog);
        seeded_workflow(&db);

        let outcome = ledger.close("s1", true, 42).unwrap();
        assert_eq!(outcome, CloseOutcome { logged: 1, cleared: true });
        assert_eq!(
            db.load_consumption_log().unwrap(),
            vec![ConsumptionEvent::new(42, "s1", "A", 12)]
        );
        assert!(db.load_workflow("s1").unwrap().is_empty());
    }

    #[test]
    fn test_close_without_save_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let catalog = catalog();
        let ledger = Ledger::new(&db, &catalog);
        seeded_workflow(&db);

        assert_eq!(ledger.close("s1", false, 1).unwrap().logged, 0);
        let second = ledger.close("s1", false, 2).unwrap();
        assert_eq!(second, CloseOutcome { logged: 0, cleared: false });
        assert!(db.load_consumption_log().unwrap().is_empty());
    }

    #[test]
    fn test_query_is_half_open() {
        let db = Database::open_in_memory().unwrap();
        let catalog = catalog();
        let ledger = Ledger::new(&db, &catalog);
        db.append_consumption(&[
            ConsumptionEvent::new(9, "s1", "A", 1),
            ConsumptionEvent::new(10, "s1", "A", 2),
            ConsumptionEvent::new(20, "s1", "A", 3),
        ])
        .unwrap();

        let hits = ledger.query(10, 20).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].qty_u, 2);
    }

    #[test]
    fn test_report_resolves_names() {
        let db = Database::open_in_memory().unwrap();
        let catalog = catalog();
        let ledger = Ledger::new(&db, &catalog);
        // 1970-01-05 is a Monday
        db.append_consumption(&[
            ConsumptionEvent::new(4 * DAY + 1, "s1", "A", 5),
            ConsumptionEvent::new(5 * DAY, "s2", "B", 9),
            ConsumptionEvent::new(11 * DAY, "s1", "A", 100),
        ])
        .unwrap();

        let period = Period::containing(
            PeriodKind::Week,
            NaiveDate::from_ymd_opt(1970, 1, 8).unwrap(),
        );
        let report = ledger.report(period, &Utc).unwrap();
        assert_eq!(report.label, "Période : 1970-01-05 → 1970-01-11");
        assert_eq!(report.entry_count, 2);
        assert_eq!(report.by_product[0].name, "Savon");
        assert_eq!(report.by_product[1].name, "Gants");
        assert_eq!(report.by_service[0].name, "s2");
        assert_eq!(report.by_service[1].name, "Bloc");
    }

    #[test]
    fn test_empty_month_report() {
        let db = Database::open_in_memory().unwrap();
        let catalog = catalog();
        let ledger = Ledger::new(&db, &catalog);

        let period = Period::containing(
            PeriodKind::Month,
            NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
        );
        let report = ledger.report(period, &Utc).unwrap();
        assert!(report.is_empty());
        assert!(report.by_product.is_empty());
        assert!(report.by_service.is_empty());
        assert_eq!(report.label, "Période : 2024-02-01 → 2024-02-29");
    }

    #[test]
    fn test_clear_all() {
        let db = Database::open_in_memory().unwrap();
        let catalog = catalog();
        let ledger = Ledger::new(&db, &catalog);
        db.append_consumption(&[ConsumptionEvent::new(1, "s1", "A", 1)])
            .unwrap();

        ledger.clear_all().unwrap();
        assert_eq!(ledger.export_csv(&Utc).unwrap(), CSV_HEADER);
    }
}
