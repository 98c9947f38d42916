//! Consumption totals.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::ConsumptionEvent;

/// Summed quantity for one key (product code or service id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Total {
    pub key: String,
    pub total: u64,
}

/// Sum quantities per product code.
pub fn aggregate_by_product(events: &[ConsumptionEvent]) -> Vec<Total> {
    aggregate_by(events, |e| &e.code)
}

/// Sum quantities per service id.
pub fn aggregate_by_service(events: &[ConsumptionEvent]) -> Vec<Total> {
    aggregate_by(events, |e| &e.service_id)
}

/// Totals sorted by descending quantity, then by key.
fn aggregate_by<F>(events: &[ConsumptionEvent], key: F) -> Vec<Total>
where
    F: Fn(&ConsumptionEvent) -> &String,
{
    let mut sums: HashMap<&str, u64> = HashMap::new();
    for event in events {
        let sum = sums.entry(key(event).as_str()).or_insert(0);
        *sum = sum.saturating_add(event.qty_u);
    }

    let mut totals: Vec<Total> = sums
        .into_iter()
        .map(|(key, total)| Total {
            key: key.to_string(),
            total,
        })
        .collect();
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events() -> Vec<ConsumptionEvent> {
        vec![
            ConsumptionEvent::new(1, "s1", "A", 5),
            ConsumptionEvent::new(2, "s2", "B", 7),
            ConsumptionEvent::new(3, "s1", "B", 3),
            ConsumptionEvent::new(4, "s2", "C", 10),
        ]
    }

    #[test]
    fn test_by_product() {
        let totals = aggregate_by_product(&events());
        assert_eq!(
            totals,
            vec![
                Total { key: "B".into(), total: 10 },
                Total { key: "C".into(), total: 10 },
                Total { key: "A".into(), total: 5 },
            ]
        );
    }

    #[test]
    fn test_by_service() {
        let totals = aggregate_by_service(&events());
        assert_eq!(totals[0], Total { key: "s2".into(), total: 17 });
        assert_eq!(totals[1], Total { key: "s1".into(), total: 8 });
    }

    #[test]
    fn test_empty() {
        assert!(aggregate_by_product(&[]).is_empty());
    }
}
