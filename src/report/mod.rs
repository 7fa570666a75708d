//! Report queries and their rendering.

pub mod generator;
pub mod queries;

pub use generator::*;
pub use queries::*;
