//! Core types and traits for amrlink.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! simulation parameter and grid records a simulation hands over, their
//! validators, the error taxonomy, and the [`Runtime`] trait through which
//! the embedded analysis runtime is reached.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod error;
pub mod field;
pub mod grid;
pub mod handle;
pub mod id;
pub mod params;
pub mod runtime;

pub use error::{DomainError, ErrorKind, RegistryError, RuntimeError, ValidationError};
pub use field::{DType, Element, FieldPtr, FieldType, FieldView};
pub use grid::{GridRecord, ValidGrid};
pub use handle::HandleTable;
pub use id::{ArrayHandle, ContainerHandle};
pub use params::SimulationParameters;
pub use runtime::{Key, ParamValue, Runtime};
