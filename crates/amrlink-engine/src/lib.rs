//! Registration engine exposing an AMR grid hierarchy to an analysis runtime.
//!
//! [`Registry`] is the single context object a simulation drives once per
//! analysis step: [`init`](Registry::init) the runtime-side containers,
//! [`set_parameters`](Registry::set_parameters) (which also allocates the
//! hierarchy arrays), then [`add_grid`](Registry::add_grid) once per local
//! grid. Field buffers are exposed as zero-copy views; nothing is copied
//! except the per-grid metadata rows.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod hierarchy;
mod registrar;
pub mod registry;
pub mod state;
mod store;

pub use config::{ConfigError, RegistryConfig, Verbosity};
pub use hierarchy::{HierarchyColumn, HierarchyTable};
pub use registry::{Registry, GRID_DATA_CONTAINER, HIERARCHY_CONTAINER, PARAM_CONTAINER};
pub use state::{Phase, RegistrationState};
pub use store::default_basename;
