//! Read-only per-service views: the entry sheet and the dotation sheet.

use serde::{Deserialize, Serialize};

use crate::models::{Remainder, RemainderField};
use crate::units::BestDisplay;

/// A row of the remainder entry sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryLine {
    /// 1-based position in the service order
    pub index: usize,
    pub code: String,
    pub name: String,
    pub target: u64,
    /// The only field accepting input for this product
    pub field: RemainderField,
    pub remainder: Remainder,
    /// Units to prepare; 0 while undeclared
    pub need: u64,
}

/// A row of the dotation sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DotationLine {
    pub index: usize,
    pub code: String,
    pub name: String,
    pub target: u64,
    /// Target expressed in cartons, packs and units
    pub equivalent: BestDisplay,
}
