//! amrlink: hand an AMR simulation's grid hierarchy to an embedded analysis
//! runtime without copying field data.
//!
//! This is the facade crate that re-exports the public API of the amrlink
//! sub-crates. Simulations written in C, C++ or Fortran link `amrlink-ffi`
//! instead; the Python-backed runtime lives in `amrlink-python`.
//!
//! # Quick start
//!
//! ```rust
//! use amrlink::prelude::*;
//! use amrlink_test_utils::{params_1d, MemoryRuntime, OwnedGrid};
//!
//! let mut registry = Registry::new(RegistryConfig::default(), MemoryRuntime::new()).unwrap();
//! registry.init().unwrap();
//! registry.set_parameters(params_1d(2)).unwrap();
//!
//! let mut left = OwnedGrid::root(0, [0.0; 3], [0.5, 0.0, 0.0], [8, 1, 1], &["density"]);
//! let mut right = OwnedGrid::root(1, [0.5, 0.0, 0.0], [1.0, 0.0, 0.0], [8, 1, 1], &["density"]);
//! registry.add_grid(&left.record()).unwrap();
//! assert_eq!(registry.unregistered_ids(), vec![1]);
//!
//! registry.add_grid(&right.record()).unwrap();
//! assert!(registry.ensure_complete().is_ok());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `amrlink-core` | Records, parameters, errors, the `Runtime` trait |
//! | [`engine`] | `amrlink-engine` | The registry, its config and hierarchy layout |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Records, parameters, field pointers and errors (`amrlink-core`).
///
/// Runtime backends implement [`types::Runtime`].
pub use amrlink_core as types;

/// The registry and its configuration (`amrlink-engine`).
pub use amrlink_engine as engine;

/// Common imports for typical amrlink usage.
pub mod prelude {
    // Records and parameters
    pub use amrlink_core::{FieldPtr, FieldType, GridRecord, SimulationParameters};

    // Errors
    pub use amrlink_core::{DomainError, ErrorKind, RegistryError, ValidationError};

    // Runtime seam
    pub use amrlink_core::{Key, ParamValue, Runtime};

    // Engine
    pub use amrlink_engine::{Registry, RegistryConfig, Verbosity};
}
