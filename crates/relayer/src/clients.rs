//! Implementations of the relayer's [`traits`](crate::traits).
//!
//! [`rpc`] and [`rest`] talk to remote services; [`local`] drives ledgers living in the same
//! process.

pub mod local;
pub mod rest;
pub mod rpc;
