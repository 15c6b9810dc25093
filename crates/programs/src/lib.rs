//! The ledger programs of the credential mirroring protocol.
//!
//! - [`emitter`]: the source-side program recording issuance and publishing a cross-chain message
//!   per issued credential.
//! - [`verifier`]: the destination-side program that materializes mirrored records from
//!   attestations.
//! - [`core_bridge`] and [`guardian`]: the bridging network's on-ledger half, i.e. message
//!   publication and guardian-set verification.
//! - [`ledger`]: the transactional host both programs run in.

pub mod core_bridge;
pub mod emitter;
pub mod errors;
pub mod guardian;
pub mod ledger;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;
