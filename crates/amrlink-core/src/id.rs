//! Strongly-typed handles into runtime-owned objects.

use std::fmt;

/// Identifies a key/value container owned by a [`Runtime`](crate::Runtime).
///
/// Handles are opaque: the runtime decides how the `u64` maps onto its
/// own objects (see [`HandleTable`](crate::HandleTable)). A handle stays
/// valid until the runtime is told to [`release_container`](crate::Runtime::release_container)
/// it or the runtime itself is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerHandle(pub u64);

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{:x}", self.0)
    }
}

impl From<u64> for ContainerHandle {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a numeric array owned (or borrowed) by a
/// [`Runtime`](crate::Runtime).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrayHandle(pub u64);

impl fmt::Display for ArrayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "array#{:x}", self.0)
    }
}

impl From<u64> for ArrayHandle {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
