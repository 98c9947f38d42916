//! Consumption log entries.

use serde::{Deserialize, Serialize};

/// One closed-out prepared quantity. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionEvent {
    /// Close timestamp, epoch milliseconds
    pub ts: i64,
    /// Service the quantity was prepared for
    pub service_id: String,
    /// Product code
    pub code: String,
    /// Quantity in base units
    pub qty_u: u64,
}

impl ConsumptionEvent {
    pub fn new(ts: i64, service_id: impl Into<String>, code: impl Into<String>, qty_u: u64) -> Self {
        Self {
            ts,
            service_id: service_id.into(),
            code: code.into(),
            qty_u,
        }
    }
}
