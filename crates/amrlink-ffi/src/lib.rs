//! C ABI for amrlink.
//!
//! Exposes the registration protocol to C, C++ and Fortran simulations
//! through a single process-wide registry bound to an embedded CPython
//! runtime. Inputs are `repr(C)` structs whose unset members carry
//! sentinel values; every entry point returns an [`AmrlinkStatus`] code.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run an FFI body, turning a panic into `AmrlinkStatus::Panicked`.
///
/// Unwinding across an `extern "C"` boundary is undefined behaviour.
macro_rules! ffi_guard {
    ($body:block) => {
        match ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| $body)) {
            Ok(code) => code,
            Err(_) => $crate::status::AmrlinkStatus::Panicked as i32,
        }
    };
}

/// Lock a mutex, returning `AmrlinkStatus::InternalError` from the
/// enclosing `ffi_guard!` body if a previous panic poisoned it.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $crate::status::AmrlinkStatus::InternalError as i32,
        }
    };
}

mod convert;
mod logging;
pub mod registry;
pub mod status;
pub mod types;

pub use registry::{
    amrlink_add_grid, amrlink_check_complete, amrlink_finalize, amrlink_grid_default,
    amrlink_grid_is_set, amrlink_init, amrlink_set_parameters,
};
pub use status::AmrlinkStatus;
pub use types::{
    AmrlinkFieldType, AmrlinkGrid, AmrlinkParameters, AmrlinkVerbosity, AMRLINK_FLT_UNDEFINED,
    AMRLINK_INT_UNDEFINED,
};
