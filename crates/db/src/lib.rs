//! Relayer persistence.
//!
//! [`relay::RelayerDb`] is implemented twice: by [`persistent::sqlite::SqliteDb`] for
//! deployments and by [`inmemory::relay::RelayerInMemory`] for tests and ephemeral runs.

pub mod errors;
pub mod inmemory;
pub mod persistent;
pub mod relay;
