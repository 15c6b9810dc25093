//! The credmirror relayer.
//!
//! A relayer watches the source ledger for credentials issued by one emitter, waits for the
//! guardian network to attest each published message and submits the attestation to the
//! verifier on the destination ledger. Progress is kept in a [`RelayerDb`]: the scan cursor and
//! a durable queue with one entry per message.
//!
//! Relayers are permissionless and may race each other. The verifier's replay protection makes
//! the first submission win; losers record [`RelayStatus::AlreadyDelivered`].
//!
//! [`RelayerDb`]: credmirror_db::relay::RelayerDb
//! [`RelayStatus::AlreadyDelivered`]: credmirror_db::relay::RelayStatus::AlreadyDelivered

pub mod acquisition;
pub mod clients;
pub mod config;
pub mod delivery;
pub mod discovery;
pub mod errors;
pub mod pool;
pub mod subscription;
pub mod supervisor;
pub mod traits;

#[cfg(test)]
mod test_utils;
