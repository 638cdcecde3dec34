//! Test utilities and mock types for amrlink development.
//!
//! Provides [`MemoryRuntime`], an in-process implementation of
//! [`Runtime`](amrlink_core::Runtime) that records every container and
//! array it is asked to create, and [`fixtures`] for building parameters
//! and grids that own their field buffers.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
mod memory;

pub use fixtures::{params_1d, params_3d, OwnedGrid};
pub use memory::{ArrayData, Entry, MemoryRuntime, OwnedKey};
