//! Preparation worklist and its summary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::PrepGroup;
use crate::units::CartonsAndPacks;

/// One product still to prepare for a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepLine {
    pub code: String,
    pub name: String,
    /// Units to prepare
    pub need: u64,
    /// Whole cartons and packs contained in the need
    pub hint: CartonsAndPacks,
    /// Amount gathered so far, `None` when not started
    pub prepared: Option<u64>,
    pub done: bool,
    pub group: PrepGroup,
}

impl PrepLine {
    /// Whether any progress has been recorded on this line.
    pub fn is_started(&self) -> bool {
        self.done || self.prepared.is_some_and(|p| p > 0)
    }
}

/// Preparation worklist of one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worklist {
    pub service_id: String,
    pub service_name: String,
    pub lines: Vec<PrepLine>,
}

impl Worklist {
    /// Build a worklist, grouping cartons, then packs, then other items.
    ///
    /// Lines arrive in the service's declared order, which is kept inside
    /// each group.
    pub fn new(service_id: String, service_name: String, mut lines: Vec<PrepLine>) -> Self {
        lines.sort_by_key(|line| line.group);
        Self {
            service_id,
            service_name,
            lines,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn summary(&self) -> WorklistSummary {
        WorklistSummary {
            service_name: self.service_name.clone(),
            line_count: self.lines.len(),
            done_count: self.lines.iter().filter(|l| l.done).count(),
            total_need: self.lines.iter().map(|l| l.need).sum(),
            total_prepared: self
                .lines
                .iter()
                .map(|l| l.prepared.unwrap_or(0).min(l.need))
                .sum(),
        }
    }
}

/// Progress totals of a worklist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorklistSummary {
    pub service_name: String,
    pub line_count: usize,
    pub done_count: usize,
    pub total_need: u64,
    /// Sum of prepared amounts, each capped at its line's need
    pub total_prepared: u64,
}

impl fmt::Display for WorklistSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line_count == 0 {
            return f.write_str(&self.service_name);
        }
        write!(
            f,
            "{} • {}/{} \"fait\" • Total à préparer: {} u • Total préparé: {} u",
            self.service_name,
            self.done_count,
            self.line_count,
            self.total_need,
            self.total_prepared
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(code: &str, group: PrepGroup, need: u64, prepared: Option<u64>, done: bool) -> PrepLine {
        PrepLine {
            code: code.to_string(),
            name: format!("Produit {}", code),
            need,
            hint: CartonsAndPacks::default(),
            prepared,
            done,
            group,
        }
    }

    #[test]
    fn test_grouping_is_stable() {
        let worklist = Worklist::new(
            "s1".into(),
            "Bloc".into(),
            vec![
                line("u1", PrepGroup::Other, 1, None, false),
                line("p1", PrepGroup::Packs, 1, None, false),
                line("c1", PrepGroup::Cartons, 1, None, false),
                line("u2", PrepGroup::Other, 1, None, false),
                line("p2", PrepGroup::Packs, 1, None, false),
                line("c2", PrepGroup::Cartons, 1, None, false),
            ],
        );
        let codes: Vec<&str> = worklist.lines.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["c1", "c2", "p1", "p2", "u1", "u2"]);
    }

    #[test]
    fn test_summary() {
        let worklist = Worklist::new(
            "s1".into(),
            "Bloc".into(),
            vec![
                line("a", PrepGroup::Other, 20, Some(20), true),
                line("b", PrepGroup::Other, 10, Some(4), false),
                line("c", PrepGroup::Other, 5, None, false),
            ],
        );
        let summary = worklist.summary();
        assert_eq!(summary.done_count, 1);
        assert_eq!(summary.total_need, 35);
        assert_eq!(summary.total_prepared, 24);
        assert_eq!(
            summary.to_string(),
            "Bloc • 1/3 \"fait\" • Total à préparer: 35 u • Total préparé: 24 u"
        );
    }

    #[test]
    fn test_empty_summary_is_service_name() {
        let worklist = Worklist::new("s1".into(), "Bloc".into(), Vec::new());
        assert_eq!(worklist.summary().to_string(), "Bloc");
    }

    #[test]
    fn test_is_started() {
        assert!(!line("a", PrepGroup::Other, 5, Some(0), false).is_started());
        assert!(line("a", PrepGroup::Other, 5, Some(1), false).is_started());
        assert!(line("a", PrepGroup::Other, 5, None, true).is_started());
    }
}
