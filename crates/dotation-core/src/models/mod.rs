//! Domain models for the dotation system.

mod catalog;
mod ledger;
mod workflow;

pub use catalog::*;
pub use ledger::*;
pub use workflow::*;
