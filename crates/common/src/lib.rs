//! Reusable plumbing for the credmirror services: tracing setup, configuration files and
//! retrying fallible async operations.

pub mod logging;
pub mod retry;
pub mod toml_file;

// Re-export tracing crate for convenience.
pub use tracing;
