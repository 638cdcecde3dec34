//! The embedded-runtime interface.
//!
//! [`Runtime`] is everything amrlink needs from the analysis side: named
//! top-level containers, nested containers keyed by string or integer,
//! freshly allocated 2D numeric arrays with element-addressed writes, and
//! non-owning views over caller memory. Interpreter bootstrap and teardown
//! are the implementation's business.

use std::fmt;

use crate::error::RuntimeError;
use crate::field::{DType, Element, FieldView};
use crate::id::{ArrayHandle, ContainerHandle};

/// Key of a container entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key<'a> {
    /// String key (field labels, parameter names).
    Str(&'a str),
    /// Integer key (grid ids).
    Int(i64),
}

impl fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
        }
    }
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(s: &'a str) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Key<'_> {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

/// A scalar, string or 3-vector published into the `param` container.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// Floating-point scalar.
    Float(f64),
    /// Integer scalar (booleans are published as 0/1).
    Int(i64),
    /// String.
    Text(String),
    /// Floating-point 3-vector, published as a tuple.
    FloatVec3([f64; 3]),
    /// Integer 3-vector, published as a tuple.
    IntVec3([i64; 3]),
}

/// Container and array services of an embedded analysis runtime.
///
/// Every method is synchronous and called from the single simulation
/// control thread.
pub trait Runtime {
    /// Create a fresh, empty top-level container published under `name`.
    ///
    /// A container already published under `name` is replaced.
    fn create_container(&mut self, name: &str) -> Result<ContainerHandle, RuntimeError>;

    /// Return the container stored under `key` in `parent`, creating and
    /// inserting an empty one if the key is absent.
    ///
    /// Fails with [`RuntimeError::WrongEntry`] if `key` holds a non-container.
    fn ensure_nested(
        &mut self,
        parent: ContainerHandle,
        key: Key<'_>,
    ) -> Result<ContainerHandle, RuntimeError>;

    /// Drop a handle obtained from [`ensure_nested`](Runtime::ensure_nested).
    ///
    /// The container itself stays reachable from its parent.
    fn release_container(&mut self, handle: ContainerHandle);

    /// Drop an array handle. An array stored in a container stays reachable
    /// from it.
    fn release_array(&mut self, handle: ArrayHandle);

    /// Number of entries in a container.
    fn container_len(&self, container: ContainerHandle) -> Result<usize, RuntimeError>;

    /// Remove every entry from a container.
    fn clear_container(&mut self, container: ContainerHandle) -> Result<(), RuntimeError>;

    /// Allocate a new `[rows, cols]` numeric array. Element values are
    /// unspecified until written.
    fn create_numeric_array(
        &mut self,
        shape: [usize; 2],
        dtype: DType,
    ) -> Result<ArrayHandle, RuntimeError>;

    /// Create a non-owning array over the caller buffer described by `view`.
    ///
    /// No bytes are copied; later writes to the caller buffer are visible
    /// through the returned array.
    fn wrap_external_buffer(&mut self, view: &FieldView) -> Result<ArrayHandle, RuntimeError>;

    /// Write one element of an array created by
    /// [`create_numeric_array`](Runtime::create_numeric_array).
    fn write_element(
        &mut self,
        array: ArrayHandle,
        row: usize,
        col: usize,
        value: Element,
    ) -> Result<(), RuntimeError>;

    /// Store an array under `key` in `container`, replacing any entry.
    fn set_array(
        &mut self,
        container: ContainerHandle,
        key: Key<'_>,
        array: ArrayHandle,
    ) -> Result<(), RuntimeError>;

    /// Store a parameter value under `key` in `container`.
    fn set_param(
        &mut self,
        container: ContainerHandle,
        key: &str,
        value: &ParamValue,
    ) -> Result<(), RuntimeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_and_conversions() {
        assert_eq!(Key::from("density").to_string(), "density");
        assert_eq!(Key::from(12i64).to_string(), "12");
        assert_eq!(Key::from(3i64), Key::Int(3));
    }
}
