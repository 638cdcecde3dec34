//! Registration FFI: init, set_parameters, add_grid, completion queries,
//! finalize.
//!
//! One registry per process, bound to a [`PyRuntime`] whose module is
//! published in `sys.modules` until [`amrlink_finalize`].

use std::ffi::c_char;
use std::sync::Mutex;

use amrlink_core::RegistryError;
use amrlink_engine::{Registry, RegistryConfig, Verbosity};
use amrlink_python::PyRuntime;
use tracing::info;

use crate::convert::{self, optional_str};
use crate::logging;
use crate::status::{code, AmrlinkStatus};
use crate::types::{AmrlinkGrid, AmrlinkParameters, AMRLINK_INT_UNDEFINED};

static REGISTRY: Mutex<Option<Registry<PyRuntime>>> = Mutex::new(None);

/// Initialize the registry and the embedded runtime.
///
/// `verbose` is an `AmrlinkVerbosity` code; `script` names the analysis
/// script, or null for the default. Calling again after a successful
/// init logs a warning and changes nothing.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn amrlink_init(verbose: i32, script: *const c_char) -> i32 {
    ffi_guard!({
        let mut slot = ffi_lock!(REGISTRY);
        if let Some(registry) = slot.as_mut() {
            return code(registry.init());
        }

        let verbosity = match Verbosity::try_from(verbose) {
            Ok(v) => v,
            Err(e) => return AmrlinkStatus::from(&e) as i32,
        };
        // SAFETY: script is null or NUL-terminated per caller contract.
        let config = match unsafe { optional_str(script) } {
            Some(script) => RegistryConfig::with_script(script),
            None => RegistryConfig::default(),
        };
        let config = RegistryConfig { verbosity, ..config };
        if let Err(e) = config.validate() {
            return AmrlinkStatus::from(&e) as i32;
        }
        logging::install(config.verbosity);

        let runtime = match PyRuntime::new(&config.module_name) {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("creating runtime module failed: {e}");
                return AmrlinkStatus::RuntimeFailed as i32;
            }
        };
        let mut registry = match Registry::new(config, runtime) {
            Ok(r) => r,
            Err(e) => return AmrlinkStatus::from(&e) as i32,
        };
        if let Err(e) = registry.init() {
            return AmrlinkStatus::from(&e) as i32;
        }
        *slot = Some(registry);
        AmrlinkStatus::Ok as i32
    })
}

/// Publish simulation parameters and allocate the hierarchy.
///
/// Replaces any previous parameters and discards every registered grid.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn amrlink_set_parameters(params: *const AmrlinkParameters) -> i32 {
    ffi_guard!({
        if params.is_null() {
            return AmrlinkStatus::InvalidArgument as i32;
        }
        let mut slot = ffi_lock!(REGISTRY);
        let Some(registry) = slot.as_mut() else {
            return not_initialized("set_parameters");
        };
        // SAFETY: params is non-null and points to a valid struct whose
        // strings are null or NUL-terminated, per caller contract.
        let params = unsafe { convert::parameters(&*params) };
        code(registry.set_parameters(params))
    })
}

/// Register one local grid and expose its field buffers.
///
/// The buffers are not copied and must outlive the analysis that reads
/// them.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn amrlink_add_grid(grid: *const AmrlinkGrid) -> i32 {
    ffi_guard!({
        if grid.is_null() {
            return AmrlinkStatus::InvalidArgument as i32;
        }
        let mut slot = ffi_lock!(REGISTRY);
        let Some(registry) = slot.as_mut() else {
            return not_initialized("add_grid");
        };
        // SAFETY: grid is non-null and its lists hold `num_fields` entries,
        // per caller contract.
        let raw = unsafe { &*grid };
        let record = match unsafe { convert::grid(raw) } {
            Ok(r) => r,
            Err(_) if !registry.state().parameters_set() => {
                return reject(RegistryError::ParametersNotSet {
                    operation: "add_grid",
                });
            }
            Err(reason) => {
                let id = (raw.id != i64::from(AMRLINK_INT_UNDEFINED)).then_some(raw.id);
                return reject(RegistryError::InvalidGrid { id, reason });
            }
        };
        code(registry.add_grid(&record))
    })
}

/// Reset `*grid` to the all-unset state.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn amrlink_grid_default(grid: *mut AmrlinkGrid) -> i32 {
    ffi_guard!({
        if grid.is_null() {
            return AmrlinkStatus::InvalidArgument as i32;
        }
        // SAFETY: grid is non-null and writable per caller contract.
        unsafe { *grid = AmrlinkGrid::default() };
        AmrlinkStatus::Ok as i32
    })
}

/// Write 1 to `*out` if grid `id` is registered, 0 otherwise.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn amrlink_grid_is_set(id: i64, out: *mut u8) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return AmrlinkStatus::InvalidArgument as i32;
        }
        let slot = ffi_lock!(REGISTRY);
        let Some(registry) = slot.as_ref() else {
            return not_initialized("grid_is_set");
        };
        if !registry.state().parameters_set() {
            return reject(RegistryError::ParametersNotSet {
                operation: "grid_is_set",
            });
        }
        // SAFETY: out is non-null and writable.
        unsafe { *out = u8::from(registry.is_registered(id)) };
        AmrlinkStatus::Ok as i32
    })
}

/// `Ok` once every declared grid is registered, `Incomplete` otherwise.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn amrlink_check_complete() -> i32 {
    ffi_guard!({
        let slot = ffi_lock!(REGISTRY);
        match slot.as_ref() {
            Some(registry) => code(registry.ensure_complete()),
            None => not_initialized("check_complete"),
        }
    })
}

/// Drop the registry and unpublish the runtime module.
///
/// A later [`amrlink_init`] starts from scratch.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn amrlink_finalize() -> i32 {
    ffi_guard!({
        let mut slot = ffi_lock!(REGISTRY);
        match slot.take() {
            Some(registry) => {
                let module = registry.config().module_name.clone();
                drop(registry);
                info!(module = %module, "finalized");
                AmrlinkStatus::Ok as i32
            }
            None => not_initialized("finalize"),
        }
    })
}

fn reject(err: RegistryError) -> i32 {
    tracing::error!(kind = ?err.kind(), "{err}");
    AmrlinkStatus::from(&err) as i32
}

fn not_initialized(operation: &'static str) -> i32 {
    reject(RegistryError::NotInitialized { operation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AMRLINK_FLT_UNDEFINED;

    // None of these touch the interpreter: every call fails before a
    // registry would be created.

    #[test]
    fn grid_default_fills_sentinels() {
        let mut grid = AmrlinkGrid {
            left_edge: [1.0; 3],
            level: 4,
            ..AmrlinkGrid::default()
        };
        assert_eq!(amrlink_grid_default(&mut grid), 0);
        assert_eq!(grid.left_edge, [AMRLINK_FLT_UNDEFINED; 3]);
        assert_eq!(grid.level, AMRLINK_INT_UNDEFINED);
    }

    #[test]
    fn null_arguments_rejected() {
        let invalid = AmrlinkStatus::InvalidArgument as i32;
        assert_eq!(amrlink_grid_default(std::ptr::null_mut()), invalid);
        assert_eq!(amrlink_set_parameters(std::ptr::null()), invalid);
        assert_eq!(amrlink_add_grid(std::ptr::null()), invalid);
        assert_eq!(amrlink_grid_is_set(0, std::ptr::null_mut()), invalid);
    }

    #[test]
    fn calls_before_init_report_not_initialized() {
        let not_init = AmrlinkStatus::NotInitialized as i32;
        let grid = AmrlinkGrid::default();
        let mut out = 7u8;
        assert_eq!(amrlink_add_grid(&grid), not_init);
        assert_eq!(amrlink_grid_is_set(0, &mut out), not_init);
        assert_eq!(out, 7);
        assert_eq!(amrlink_check_complete(), not_init);
        assert_eq!(amrlink_finalize(), not_init);
    }

    #[test]
    fn bad_verbosity_rejected_before_runtime_exists() {
        assert_eq!(
            amrlink_init(9, std::ptr::null()),
            AmrlinkStatus::ConfigError as i32
        );
        assert_eq!(amrlink_finalize(), AmrlinkStatus::NotInitialized as i32);
    }

    #[test]
    fn empty_script_rejected() {
        let empty = c"";
        assert_eq!(
            amrlink_init(2, empty.as_ptr()),
            AmrlinkStatus::ConfigError as i32
        );
    }
}
