//! Python exception -> [`RuntimeError`] mapping.

use amrlink_core::RuntimeError;
use numpy::BorrowError;
use pyo3::PyErr;

/// Wrap a Python exception raised by the interpreter.
pub(crate) fn backend(err: PyErr) -> RuntimeError {
    RuntimeError::Backend {
        reason: err.to_string(),
    }
}

/// A numpy array that is already borrowed elsewhere.
pub(crate) fn borrowed(err: BorrowError) -> RuntimeError {
    RuntimeError::Backend {
        reason: format!("array is borrowed: {err}"),
    }
}

/// Reject `[row, col]` outside `shape`.
pub(crate) fn check_index(row: usize, col: usize, shape: [usize; 2]) -> Result<(), RuntimeError> {
    if row < shape[0] && col < shape[1] {
        Ok(())
    } else {
        Err(RuntimeError::OutOfBounds { row, col, shape })
    }
}
