//! Aggregation over the attendance log.
//!
//! Everything here is a pure function of the roster and log; nothing is
//! cached between queries.

pub mod aggregator;

pub use aggregator::*;
