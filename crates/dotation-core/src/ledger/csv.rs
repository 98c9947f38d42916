//! CSV export of consumption events.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{Catalog, ConsumptionEvent};

pub const CSV_COLUMNS: [&str; 5] = ["date", "service", "code", "produit", "qtyU"];

/// Header row as written, quoted like every other row.
pub const CSV_HEADER: &str = r#""date","service","code","produit","qtyU""#;

/// Render events as CSV, one row per event.
///
/// Every field is quoted. Rows are joined by `\n` without a trailing newline.
pub fn export_csv<Tz: TimeZone>(events: &[ConsumptionEvent], catalog: &Catalog, tz: &Tz) -> String {
    let mut rows = Vec::with_capacity(events.len() + 1);
    rows.push(quoted_row(&CSV_COLUMNS));

    for event in events {
        let product_name = catalog
            .product(&event.code)
            .map(|p| p.name.as_str())
            .unwrap_or("");
        rows.push(quoted_row(&[
            local_date(event.ts, tz),
            catalog.service_name(&event.service_id).to_string(),
            event.code.clone(),
            product_name.to_string(),
            event.qty_u.to_string(),
        ]));
    }

    rows.join("\n")
}

/// ISO date of an epoch-millis timestamp in the given zone.
pub fn local_date<Tz: TimeZone>(ts: i64, tz: &Tz) -> String {
    let utc = DateTime::<Utc>::from_timestamp_millis(ts).unwrap_or_default();
    utc.with_timezone(tz).date_naive().format("%Y-%m-%d").to_string()
}

fn quoted_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|field| quote(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, Service};
    use chrono::FixedOffset;
    use std::collections::HashMap;

    fn catalog() -> Catalog {
        Catalog::new(
            vec![Product::new("A".into(), "Gants \"M\"".into())],
            vec![Service::new("s1", "Bloc, nord")],
            HashMap::new(),
            HashMap::new(),
        )
    }

    #[test]
    fn test_empty_export_is_header_only() {
        assert_eq!(export_csv(&[], &catalog(), &Utc), CSV_HEADER);
    }

    #[test]
    fn test_header_fields_are_quoted() {
        let csv = export_csv(&[ConsumptionEvent::new(0, "s1", "A", 1)], &catalog(), &Utc);
        assert_eq!(
            csv.lines().next(),
            Some(r#""date","service","code","produit","qtyU""#)
        );
        assert_eq!(quoted_row(&CSV_COLUMNS), CSV_HEADER);
    }

    #[test]
    fn test_rows_are_quoted() {
        let events = vec![
            ConsumptionEvent::new(0, "s1", "A", 20),
            ConsumptionEvent::new(86_400_000, "s9", "Z", 3),
        ];
        let csv = export_csv(&events, &catalog(), &Utc);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            r#""1970-01-01","Bloc, nord","A","Gants ""M""","20""#
        );
        // Unknown service falls back to its id, unknown product to empty
        assert_eq!(lines[2], r#""1970-01-02","s9","Z","","3""#);
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_local_date_uses_zone() {
        let minus_two = FixedOffset::west_opt(2 * 3600).unwrap();
        assert_eq!(local_date(3_600_000, &Utc), "1970-01-01");
        assert_eq!(local_date(3_600_000, &minus_two), "1969-12-31");
    }
}
