//! Weekly analytics.
//!
//! `aggregator` reduces one week of entries; `comparison` composes it across
//! the current, previous and comparison weeks.

pub mod aggregator;
pub mod comparison;

pub use aggregator::*;
pub use comparison::ComparisonEngine;
