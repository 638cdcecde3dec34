//! C-compatible status codes.
//!
//! [`AmrlinkStatus`] is a `repr(i32)` enum covering every failure class of
//! the registration protocol. Conversions from [`RegistryError`] and
//! [`ConfigError`] are provided.

use amrlink_core::RegistryError;
use amrlink_engine::ConfigError;

/// C-compatible status code returned by all FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmrlinkStatus {
    /// Success.
    Ok = 0,
    /// `amrlink_init` has not been called.
    NotInitialized = -1,
    /// `amrlink_set_parameters` has not succeeded yet.
    ParametersNotSet = -2,
    /// A parameter or grid member is unset, malformed or out of range.
    ValidationFailed = -3,
    /// A grid id, parent id or edge lies outside the declared hierarchy.
    OutOfDomain = -4,
    /// The grid id was registered before.
    Duplicate = -5,
    /// A hierarchy container could not be created.
    AllocationFailed = -6,
    /// The embedded runtime failed while being written to.
    RuntimeFailed = -7,
    /// Some grids have not been registered.
    Incomplete = -8,
    /// Invalid verbosity, script or module name.
    ConfigError = -17,
    /// An argument is null or otherwise unusable.
    InvalidArgument = -18,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -20,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&RegistryError> for AmrlinkStatus {
    fn from(e: &RegistryError) -> Self {
        match e {
            RegistryError::NotInitialized { .. } => AmrlinkStatus::NotInitialized,
            RegistryError::ParametersNotSet { .. } => AmrlinkStatus::ParametersNotSet,
            RegistryError::InvalidParameters(_) | RegistryError::InvalidGrid { .. } => {
                AmrlinkStatus::ValidationFailed
            }
            RegistryError::OutOfDomain(_) => AmrlinkStatus::OutOfDomain,
            RegistryError::AlreadyRegistered { .. } => AmrlinkStatus::Duplicate,
            RegistryError::Allocation { .. } => AmrlinkStatus::AllocationFailed,
            RegistryError::Runtime(_) => AmrlinkStatus::RuntimeFailed,
            RegistryError::IncompleteHierarchy { .. } => AmrlinkStatus::Incomplete,
        }
    }
}

impl From<&ConfigError> for AmrlinkStatus {
    fn from(_: &ConfigError) -> Self {
        AmrlinkStatus::ConfigError
    }
}

/// Status of a registry call, as the `i32` handed back to C.
pub(crate) fn code(result: Result<(), RegistryError>) -> i32 {
    match result {
        Ok(()) => AmrlinkStatus::Ok as i32,
        Err(e) => AmrlinkStatus::from(&e) as i32,
    }
}
