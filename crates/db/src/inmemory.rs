//! In-memory implementations of the database traits.

pub mod errors;
pub mod relay;
