//! JSON-RPC interface of the devnet ledgers and the attestation service.
//!
//! The interface is split into three namespaces, one per party of the relay protocol:
//! `source` (the emitter's ledger), `destination` (the verifier's ledger) and `attestation` (the
//! guardian network). Program failures travel as JSON-RPC errors whose code identifies the
//! failure; see [`errors`].

pub mod errors;
pub mod traits;
pub mod types;
