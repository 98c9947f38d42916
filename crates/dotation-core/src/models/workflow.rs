//! Per-service preparation workflow state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::catalog::{Product, RemainderField};
use crate::units::units_from_remainder;

/// Quantity on hand declared by staff for one product.
///
/// A product accepts either packs or units, never both.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum Remainder {
    /// Nothing entered yet (distinct from zero)
    #[default]
    Undeclared,
    /// Whole packs on hand
    Packs(u64),
    /// Raw units on hand
    Units(u64),
}

impl Remainder {
    /// Build a remainder for the given field; `None` means the field was cleared.
    pub fn from_field(field: RemainderField, count: Option<u64>) -> Self {
        match (field, count) {
            (_, None) => Remainder::Undeclared,
            (RemainderField::Packs, Some(n)) => Remainder::Packs(n),
            (RemainderField::Units, Some(n)) => Remainder::Units(n),
        }
    }

    pub fn is_declared(&self) -> bool {
        !matches!(self, Remainder::Undeclared)
    }

    /// Remainder expressed in base units, `None` while undeclared.
    pub fn units(&self, product: &Product) -> Option<u64> {
        match *self {
            Remainder::Undeclared => None,
            Remainder::Packs(n) => Some(units_from_remainder(product, n, 0)),
            Remainder::Units(n) => Some(units_from_remainder(product, 0, n)),
        }
    }

    /// Replenishment need against a target, floored at zero.
    ///
    /// An undeclared remainder needs nothing.
    pub fn need(&self, product: &Product, target: u64) -> u64 {
        self.units(product)
            .map_or(0, |on_hand| target.saturating_sub(on_hand))
    }

    /// Raw count as entered, if any.
    pub fn count(&self) -> Option<u64> {
        match *self {
            Remainder::Undeclared => None,
            Remainder::Packs(n) | Remainder::Units(n) => Some(n),
        }
    }
}

/// Lifecycle state of one (service, product) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ItemState {
    /// No remainder entered
    Undeclared,
    /// Remainder entered, nothing prepared yet
    Declared,
    /// Partially prepared
    InProgress,
    /// Fully prepared and checked
    Done,
}

/// Entry, prepared and done records of one service, persisted as one blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceWorkflow {
    /// Declared remainders; undeclared pairs are absent
    #[serde(default)]
    pub entries: BTreeMap<String, Remainder>,
    /// Prepared amounts in base units
    #[serde(default)]
    pub prepared: BTreeMap<String, u64>,
    /// Products checked as done
    #[serde(default)]
    pub done: BTreeSet<String>,
}

impl ServiceWorkflow {
    pub fn remainder(&self, code: &str) -> Remainder {
        self.entries.get(code).copied().unwrap_or_default()
    }

    /// Store a remainder. Clearing it also drops downstream records.
    pub fn set_remainder(&mut self, code: &str, remainder: Remainder) {
        if remainder.is_declared() {
            self.entries.insert(code.to_string(), remainder);
        } else {
            self.entries.remove(code);
            self.purge(code);
        }
    }

    pub fn prepared(&self, code: &str) -> Option<u64> {
        self.prepared.get(code).copied()
    }

    pub fn is_done(&self, code: &str) -> bool {
        self.done.contains(code)
    }

    /// Drop prepared and done records of one product. Returns whether anything changed.
    pub fn purge(&mut self, code: &str) -> bool {
        let had_prepared = self.prepared.remove(code).is_some();
        let had_done = self.done.remove(code);
        had_prepared || had_done
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.prepared.is_empty() && self.done.is_empty()
    }

    /// Lifecycle state of a product. Only a checked item is done.
    pub fn item_state(&self, code: &str) -> ItemState {
        if !self.remainder(code).is_declared() {
            ItemState::Undeclared
        } else if self.is_done(code) {
            ItemState::Done
        } else if self.prepared(code).is_some_and(|amount| amount > 0) {
            ItemState::InProgress
        } else {
            ItemState::Declared
        }
    }
}
