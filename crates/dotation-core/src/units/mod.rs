//! Unit conversion engine.
//!
//! Pure functions over a [`Product`](crate::models::Product) and integer
//! unit counts.

mod convert;
mod normalize;

pub use convert::*;
pub use normalize::*;
