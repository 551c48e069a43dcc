//! Analysis modules.
//!
//! Frequency aggregation and the insight lines derived from it.

pub mod aggregator;

pub use aggregator::*;
