//! Attendbook - class attendance ledger and reports.
//!
//! The library is layered one way: [`storage`] loads and saves the JSON
//! documents, [`ledger`] owns the roster and log and is the only mutation
//! path, [`analysis`] computes tallies and rates, and [`report`] turns those
//! into rows for a presentation layer.

pub mod analysis;
pub mod error;
pub mod ledger;
pub mod models;
pub mod report;
pub mod storage;

pub use error::{AttendanceError, Result};
pub use ledger::Ledger;
pub use report::Reports;
pub use storage::JsonStore;
