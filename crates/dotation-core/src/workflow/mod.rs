//! Replenishment workflow state machine.
//!
//! ```text
//! Undeclared ──declare──▶ Declared ──prepare──▶ InProgress ──prepare=need──▶ Done
//!      ▲                     │                                  ▲
//!      └──clear entry────────┘            check ────────────────┘
//! ```
//!
//! Every operation reads the service's workflow record, applies one
//! transition and writes the record back before returning.

mod sheets;
mod worklist;

pub use sheets::*;
pub use worklist::*;

use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{Catalog, ItemState, Product, Remainder, RemainderField, ServiceWorkflow};
use crate::units::{decompose_to_best_display, decompose_to_cartons_and_packs, parse_quantity};

/// Workflow errors.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Product {code} is not in the dotation of service {service_id}")]
    NotInDotation { service_id: String, code: String },
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Result of a remainder entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryUpdate {
    /// Remainder now stored
    pub remainder: Remainder,
    /// Recomputed need
    pub need: u64,
    /// The input targeted the field disabled for this product and was dropped
    pub ignored: bool,
}

/// Workflow manager for one catalog snapshot.
pub struct Preparation<'a> {
    db: &'a Database,
    catalog: &'a Catalog,
}

impl<'a> Preparation<'a> {
    /// Create a new workflow manager.
    pub fn new(db: &'a Database, catalog: &'a Catalog) -> Self {
        Self { db, catalog }
    }

    fn ensure_service(&self, service_id: &str) -> WorkflowResult<()> {
        if self.catalog.service(service_id).is_none() && self.catalog.dotation_count(service_id) == 0 {
            return Err(WorkflowError::UnknownService(service_id.to_string()));
        }
        Ok(())
    }

    /// Product of a (service, product) pair that the service's dotation lists.
    fn resolve(&self, service_id: &str, code: &str) -> WorkflowResult<&'a Product> {
        self.ensure_service(service_id)?;
        let product = self
            .catalog
            .product(code)
            .ok_or_else(|| WorkflowError::UnknownProduct(code.to_string()))?;
        if !self.catalog.has_dotation(service_id, code) {
            return Err(WorkflowError::NotInDotation {
                service_id: service_id.to_string(),
                code: code.to_string(),
            });
        }
        Ok(product)
    }

    fn need_of(&self, workflow: &ServiceWorkflow, service_id: &str, product: &Product) -> u64 {
        let target = self.catalog.target(service_id, &product.code);
        workflow.remainder(&product.code).need(product, target)
    }

    /// Products of the service's dotation, in order, that exist in the catalog.
    fn ordered_products(&self, service_id: &str) -> Vec<&'a Product> {
        self.catalog
            .ordered_codes(service_id)
            .iter()
            .filter_map(|code| self.catalog.product(code))
            .collect()
    }

    /// Declare the quantity on hand from raw field input.
    ///
    /// Empty input clears the remainder. Input aimed at the field the product
    /// does not accept is ignored. A need of zero purges prepared and done;
    /// otherwise prepared is only lowered to the new need, and a need rising
    /// above it reopens a done item. Declaring never checks an item.
    pub fn declare_remainder(
        &self,
        service_id: &str,
        code: &str,
        field: RemainderField,
        input: &str,
    ) -> WorkflowResult<EntryUpdate> {
        let product = self.resolve(service_id, code)?;
        let mut workflow = self.db.load_workflow(service_id)?;

        if field != product.entry_field() {
            tracing::debug!(service_id, code, ?field, "input on disabled field ignored");
            return Ok(EntryUpdate {
                remainder: workflow.remainder(code),
                need: self.need_of(&workflow, service_id, product),
                ignored: true,
            });
        }

        let remainder = Remainder::from_field(field, parse_quantity(input));
        workflow.set_remainder(code, remainder);
        let need = self.need_of(&workflow, service_id, product);

        if need == 0 {
            workflow.purge(code);
        } else if let Some(prepared) = workflow.prepared(code) {
            if prepared > need {
                workflow.prepared.insert(code.to_string(), need);
            } else if prepared < need {
                workflow.done.remove(code);
            }
        }

        self.db.save_workflow(service_id, &workflow)?;
        tracing::debug!(service_id, code, ?remainder, need, "remainder declared");
        Ok(EntryUpdate {
            remainder,
            need,
            ignored: false,
        })
    }

    /// Declare the remainder through whichever field the product accepts.
    pub fn declare(&self, service_id: &str, code: &str, input: &str) -> WorkflowResult<EntryUpdate> {
        let field = self.resolve(service_id, code)?.entry_field();
        self.declare_remainder(service_id, code, field, input)
    }

    /// Current need of a pair; 0 while undeclared.
    pub fn need(&self, service_id: &str, code: &str) -> WorkflowResult<u64> {
        let product = self.resolve(service_id, code)?;
        let workflow = self.db.load_workflow(service_id)?;
        Ok(self.need_of(&workflow, service_id, product))
    }

    /// Lifecycle state of a pair.
    pub fn item_state(&self, service_id: &str, code: &str) -> WorkflowResult<ItemState> {
        self.resolve(service_id, code)?;
        Ok(self.db.load_workflow(service_id)?.item_state(code))
    }

    /// Record the prepared amount from raw input, capped at the need.
    ///
    /// Empty input clears both prepared and done, as does any input while
    /// nothing is needed; both return `None`. Reaching the need marks the
    /// item done; anything below un-marks it.
    pub fn set_prepared(
        &self,
        service_id: &str,
        code: &str,
        input: &str,
    ) -> WorkflowResult<Option<u64>> {
        let product = self.resolve(service_id, code)?;
        let mut workflow = self.db.load_workflow(service_id)?;
        let need = self.need_of(&workflow, service_id, product);

        let stored = match parse_quantity(input) {
            None => {
                workflow.purge(code);
                None
            }
            Some(_) if need == 0 => {
                workflow.purge(code);
                None
            }
            Some(amount) => {
                let capped = amount.min(need);
                workflow.prepared.insert(code.to_string(), capped);
                if capped >= need {
                    workflow.done.insert(code.to_string());
                } else {
                    workflow.done.remove(code);
                }
                Some(capped)
            }
        };

        self.db.save_workflow(service_id, &workflow)?;
        tracing::debug!(service_id, code, ?stored, need, "prepared amount set");
        Ok(stored)
    }

    /// Check or uncheck the done box of a pair.
    ///
    /// Checking forces prepared to the need; unchecking keeps the prepared
    /// amount. Items with nothing to prepare cannot be checked.
    pub fn set_done(&self, service_id: &str, code: &str, checked: bool) -> WorkflowResult<ItemState> {
        let product = self.resolve(service_id, code)?;
        let mut workflow = self.db.load_workflow(service_id)?;
        let need = self.need_of(&workflow, service_id, product);

        if checked && need > 0 {
            workflow.done.insert(code.to_string());
            workflow.prepared.insert(code.to_string(), need);
        } else {
            workflow.done.remove(code);
        }

        self.db.save_workflow(service_id, &workflow)?;
        Ok(workflow.item_state(code))
    }

    /// Mark every declared item with a positive need as done.
    ///
    /// Returns the number of items marked.
    pub fn check_all(&self, service_id: &str) -> WorkflowResult<usize> {
        self.ensure_service(service_id)?;
        let mut workflow = self.db.load_workflow(service_id)?;
        let mut marked = 0;

        for product in self.ordered_products(service_id) {
            if !workflow.remainder(&product.code).is_declared() {
                continue;
            }
            let need = self.need_of(&workflow, service_id, product);
            if need == 0 {
                continue;
            }
            workflow.done.insert(product.code.clone());
            workflow.prepared.insert(product.code.clone(), need);
            marked += 1;
        }

        self.db.save_workflow(service_id, &workflow)?;
        tracing::info!(service_id, marked, "all items checked");
        Ok(marked)
    }

    /// Clear every done flag of a service; prepared amounts stay.
    pub fn uncheck_all(&self, service_id: &str) -> WorkflowResult<usize> {
        self.ensure_service(service_id)?;
        let mut workflow = self.db.load_workflow(service_id)?;
        let cleared = workflow.done.len();
        workflow.done.clear();
        self.db.save_workflow(service_id, &workflow)?;
        tracing::info!(service_id, cleared, "all items unchecked");
        Ok(cleared)
    }

    /// Build the preparation worklist of a service.
    ///
    /// Declared items whose need dropped to zero lose their prepared and
    /// done records as a side effect.
    pub fn worklist(&self, service_id: &str) -> WorkflowResult<Worklist> {
        self.ensure_service(service_id)?;
        let mut workflow = self.db.load_workflow(service_id)?;
        let mut purged = false;
        let mut lines = Vec::new();

        for product in self.ordered_products(service_id) {
            let code = &product.code;
            if !workflow.remainder(code).is_declared() {
                continue;
            }
            let need = self.need_of(&workflow, service_id, product);
            if need == 0 {
                purged |= workflow.purge(code);
                continue;
            }
            lines.push(PrepLine {
                code: code.clone(),
                name: product.name.clone(),
                need,
                hint: decompose_to_cartons_and_packs(product, need),
                prepared: workflow.prepared(code),
                done: workflow.is_done(code),
                group: product.prep_group(),
            });
        }

        if purged {
            self.db.save_workflow(service_id, &workflow)?;
            tracing::debug!(service_id, "stale prepared records purged");
        }

        Ok(Worklist::new(
            service_id.to_string(),
            self.catalog.service_name(service_id).to_string(),
            lines,
        ))
    }

    /// Remainder entry sheet of a service.
    pub fn entry_sheet(&self, service_id: &str) -> WorkflowResult<Vec<EntryLine>> {
        self.ensure_service(service_id)?;
        let workflow = self.db.load_workflow(service_id)?;

        Ok(self
            .ordered_products(service_id)
            .into_iter()
            .enumerate()
            .map(|(i, product)| EntryLine {
                index: i + 1,
                code: product.code.clone(),
                name: product.name.clone(),
                target: self.catalog.target(service_id, &product.code),
                field: product.entry_field(),
                remainder: workflow.remainder(&product.code),
                need: self.need_of(&workflow, service_id, product),
            })
            .collect())
    }

    /// Dotation targets of a service with their carton/pack/unit equivalent.
    pub fn dotation_sheet(&self, service_id: &str) -> WorkflowResult<Vec<DotationLine>> {
        self.ensure_service(service_id)?;
        Ok(self
            .ordered_products(service_id)
            .into_iter()
            .enumerate()
            .map(|(i, product)| {
                let target = self.catalog.target(service_id, &product.code);
                DotationLine {
                    index: i + 1,
                    code: product.code.clone(),
                    name: product.name.clone(),
                    target,
                    equivalent: decompose_to_best_display(product, target),
                }
            })
            .collect())
    }
}
