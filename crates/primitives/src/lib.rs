//! This crate contains the protocol definitions shared by the ledger programs, the relayer and
//! the RPC layer: identifiers, hashes, the cross-chain message body, the issuance payload codec,
//! the attestation wire format and the events the ledgers log.
//!
//! It lies at the bottom of the crate-hierarchy in this workspace i.e., it does not depend on any
//! other crate in this workspace.

pub mod attestation;
pub mod buf;
pub mod constants;
pub mod errors;
pub mod events;
pub mod message;
pub mod types;

#[cfg(test)]
mod test_utils;
