//! Mapping between program failures and JSON-RPC error codes.
//!
//! Every [`ErrorKind`] has a stable code, counting down from [`PROGRAM_ERROR_BASE`] in the
//! order of [`ErrorKind::ALL`]. Clients classify failures by code; the message is for humans.

use credmirror_programs::errors::{ErrorKind, ProgramError};
use jsonrpsee::types::{error::INTERNAL_ERROR_CODE, ErrorObjectOwned};

/// Code of the first program error kind.
pub const PROGRAM_ERROR_BASE: i32 = -32010;

/// Returns the JSON-RPC error code of a program error kind.
pub fn code_of(kind: ErrorKind) -> i32 {
    let index = ErrorKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_default();

    PROGRAM_ERROR_BASE - index as i32
}

/// Returns the program error kind identified by a JSON-RPC error code, if any.
pub fn kind_of(code: i32) -> Option<ErrorKind> {
    let index = PROGRAM_ERROR_BASE.checked_sub(code)?;
    usize::try_from(index)
        .ok()
        .and_then(|index| ErrorKind::ALL.get(index).copied())
}

/// Converts a program error into a JSON-RPC error object carrying its kind as data.
pub fn program_error(err: &ProgramError) -> ErrorObjectOwned {
    let kind = err.kind();
    ErrorObjectOwned::owned(code_of(kind), err.to_string(), Some(kind))
}

/// Builds an internal error for failures that are not program errors.
pub fn internal_error(msg: impl Into<String>) -> ErrorObjectOwned {
    ErrorObjectOwned::owned::<()>(INTERNAL_ERROR_CODE, msg.into(), None)
}
