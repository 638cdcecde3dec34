//! Embedded CPython runtime for amrlink.
//!
//! [`PyRuntime`] implements [`Runtime`](amrlink_core::Runtime) on top of an
//! embedded interpreter: containers are `dict`s published as attributes of
//! a module registered in `sys.modules`, hierarchy arrays are freshly
//! allocated numpy arrays, and field buffers are exposed as numpy arrays
//! that borrow the simulation's memory. Interpreter startup is left to
//! PyO3's `auto-initialize`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![allow(unsafe_code)]

mod error;
mod runtime;

pub use runtime::PyRuntime;
