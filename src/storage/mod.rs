//! Persistence of the roster and attendance documents.
//!
//! Both documents are flat JSON files. Each save rewrites the whole
//! attendance document.

pub mod json_store;

pub use json_store::*;
