//! Error types for amrlink.
//!
//! [`ValidationError`] is produced by the pure record validators,
//! [`DomainError`] by the checks that need the global parameters,
//! [`RuntimeError`] by [`Runtime`](crate::Runtime) implementations, and
//! [`RegistryError`] wraps all of them for the registry entry points.
//! [`RegistryError::kind`] folds every variant into the coarse
//! [`ErrorKind`] taxonomy callers dispatch on.

use std::error::Error;
use std::fmt;

use crate::field::DType;

fn component(f: &mut fmt::Formatter<'_>, field: &str, index: Option<usize>) -> fmt::Result {
    match index {
        Some(d) => write!(f, "\"{field}[{d}]\""),
        None => write!(f, "\"{field}\""),
    }
}

/// A grid or parameter record is incomplete or out of range.
///
/// These checks never need knowledge of other grids or of the domain.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationError {
    /// A required member was never set.
    Unset {
        /// Member name.
        field: &'static str,
        /// Component index for 3-vectors.
        component: Option<usize>,
    },
    /// An integer member violates its lower bound.
    OutOfRange {
        /// Member name.
        field: &'static str,
        /// Component index for 3-vectors.
        component: Option<usize>,
        /// The offending value.
        value: i64,
        /// Human-readable requirement, e.g. `"> 0"`.
        requirement: &'static str,
    },
    /// A floating-point member is NaN or infinite, or breaks an ordering rule.
    InvalidFloat {
        /// Member name.
        field: &'static str,
        /// Component index for 3-vectors.
        component: Option<usize>,
        /// The offending value.
        value: f64,
        /// Human-readable requirement.
        requirement: &'static str,
    },
    /// A per-field list does not hold `num_fields` entries.
    FieldCountMismatch {
        /// Which list (`field_labels` or `field_data`).
        field: &'static str,
        /// The declared `num_fields`.
        expected: usize,
        /// The list length.
        actual: usize,
    },
    /// A field label is empty.
    EmptyLabel {
        /// Field index.
        index: usize,
    },
    /// Two fields share a label.
    DuplicateLabel {
        /// The repeated label.
        label: String,
    },
    /// A field buffer pointer is null.
    NullFieldData {
        /// Field index.
        index: usize,
    },
    /// A parameter-specific rule is violated.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the violated rule.
        reason: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset {
                field,
                component: c,
            } => {
                component(f, field, *c)?;
                write!(f, " has not been set")
            }
            Self::OutOfRange {
                field,
                component: c,
                value,
                requirement,
            } => {
                component(f, field, *c)?;
                write!(f, " == {value}, must be {requirement}")
            }
            Self::InvalidFloat {
                field,
                component: c,
                value,
                requirement,
            } => {
                component(f, field, *c)?;
                write!(f, " == {value:e}, must be {requirement}")
            }
            Self::FieldCountMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "\"{field}\" holds {actual} entries but num_fields == {expected}"
            ),
            Self::EmptyLabel { index } => write!(f, "field label [{index}] is empty"),
            Self::DuplicateLabel { label } => write!(f, "field label \"{label}\" is repeated"),
            Self::NullFieldData { index } => write!(f, "field_data[{index}] is null"),
            Self::InvalidParameter { name, reason } => write!(f, "\"{name}\": {reason}"),
        }
    }
}

impl Error for ValidationError {}

/// A grid does not fit the declared hierarchy or simulation domain.
#[derive(Clone, Debug, PartialEq)]
pub enum DomainError {
    /// Grid id is not below the declared grid count.
    IdOutOfRange {
        /// Grid id.
        id: i64,
        /// Declared total number of grids.
        num_grids: i64,
    },
    /// Parent id is not below the declared grid count.
    ParentOutOfRange {
        /// Grid id.
        id: i64,
        /// Offending parent id.
        parent_id: i64,
        /// Declared total number of grids.
        num_grids: i64,
    },
    /// A refined grid (level > 0) has no parent.
    MissingParent {
        /// Grid id.
        id: i64,
        /// Offending parent id.
        parent_id: i64,
        /// Grid level.
        level: i32,
    },
    /// The grid's left edge lies below the domain's left edge.
    LeftEdgeOutside {
        /// Grid id.
        id: i64,
        /// Dimension index.
        dim: usize,
        /// Grid left edge.
        edge: f64,
        /// Domain left edge.
        domain: f64,
    },
    /// The grid's right edge lies beyond the domain's right edge.
    RightEdgeOutside {
        /// Grid id.
        id: i64,
        /// Dimension index.
        dim: usize,
        /// Grid right edge.
        edge: f64,
        /// Domain right edge.
        domain: f64,
    },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdOutOfRange { id, num_grids } => {
                write!(f, "grid id [{id}] >= total number of grids [{num_grids}]")
            }
            Self::ParentOutOfRange {
                id,
                parent_id,
                num_grids,
            } => write!(
                f,
                "grid [{id}] parent id [{parent_id}] >= total number of grids [{num_grids}]"
            ),
            Self::MissingParent {
                id,
                parent_id,
                level,
            } => write!(f, "grid [{id}] parent id [{parent_id}] < 0 at level [{level}]"),
            Self::LeftEdgeOutside {
                id,
                dim,
                edge,
                domain,
            } => write!(
                f,
                "grid [{id}] left edge [{edge:13.7e}] < domain left edge [{domain:13.7e}] along dimension [{dim}]"
            ),
            Self::RightEdgeOutside {
                id,
                dim,
                edge,
                domain,
            } => write!(
                f,
                "grid [{id}] right edge [{edge:13.7e}] > domain right edge [{domain:13.7e}] along dimension [{dim}]"
            ),
        }
    }
}

impl Error for DomainError {}

/// Failures reported by a [`Runtime`](crate::Runtime) implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeError {
    /// A container or array handle was released or never existed.
    StaleHandle {
        /// The raw handle value.
        handle: u64,
    },
    /// An element write fell outside an array's shape.
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
        /// Array shape `[rows, cols]`.
        shape: [usize; 2],
    },
    /// An element or view did not match the array's dtype.
    TypeMismatch {
        /// Dtype of the target.
        expected: DType,
        /// Dtype supplied.
        actual: DType,
    },
    /// A key exists but holds an entry of the wrong kind.
    WrongEntry {
        /// The key that was looked up.
        key: String,
    },
    /// The embedded runtime itself reported an error.
    Backend {
        /// Message from the runtime.
        reason: String,
    },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleHandle { handle } => write!(f, "stale runtime handle {handle:#x}"),
            Self::OutOfBounds { row, col, shape } => write!(
                f,
                "element [{row}, {col}] outside array of shape [{}, {}]",
                shape[0], shape[1]
            ),
            Self::TypeMismatch { expected, actual } => {
                write!(f, "dtype mismatch: array is {expected}, got {actual}")
            }
            Self::WrongEntry { key } => write!(f, "key \"{key}\" holds an entry of another kind"),
            Self::Backend { reason } => write!(f, "runtime error: {reason}"),
        }
    }
}

impl Error for RuntimeError {}

/// Coarse failure classes of the registration protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operation invoked out of the required order.
    Sequence,
    /// Malformed or out-of-range record.
    Validation,
    /// Grid geometry or id outside the declared global bounds.
    Domain,
    /// Grid id already registered.
    Duplicate,
    /// A backing container could not be created.
    Allocation,
    /// The runtime failed while an already-created container was written.
    Runtime,
    /// Some grids were never registered.
    Incomplete,
}

/// Errors returned by the registry entry points.
#[derive(Clone, Debug, PartialEq)]
pub enum RegistryError {
    /// The runtime has not been initialized.
    NotInitialized {
        /// The operation that was attempted.
        operation: &'static str,
    },
    /// Simulation parameters have not been set.
    ParametersNotSet {
        /// The operation that was attempted.
        operation: &'static str,
    },
    /// Simulation parameters failed validation.
    InvalidParameters(ValidationError),
    /// A grid record failed validation.
    InvalidGrid {
        /// Grid id, if it was set.
        id: Option<i64>,
        /// The failed check.
        reason: ValidationError,
    },
    /// A grid does not fit the declared hierarchy or domain.
    OutOfDomain(DomainError),
    /// A grid id was registered before.
    AlreadyRegistered {
        /// Grid id.
        id: i64,
    },
    /// Creating a backing container failed.
    Allocation {
        /// Key of the container being created.
        key: &'static str,
        /// The runtime failure.
        reason: RuntimeError,
    },
    /// Writing to an existing container failed.
    Runtime(RuntimeError),
    /// Grids are still missing from the hierarchy.
    IncompleteHierarchy {
        /// Ids of the unregistered grids.
        missing: Vec<i64>,
    },
}

impl RegistryError {
    /// Failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInitialized { .. } | Self::ParametersNotSet { .. } => ErrorKind::Sequence,
            Self::InvalidParameters(_) | Self::InvalidGrid { .. } => ErrorKind::Validation,
            Self::OutOfDomain(_) => ErrorKind::Domain,
            Self::AlreadyRegistered { .. } => ErrorKind::Duplicate,
            Self::Allocation { .. } => ErrorKind::Allocation,
            Self::Runtime(_) => ErrorKind::Runtime,
            Self::IncompleteHierarchy { .. } => ErrorKind::Incomplete,
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized { operation } => {
                write!(f, "runtime must be initialized before calling {operation}()")
            }
            Self::ParametersNotSet { operation } => {
                write!(f, "parameters must be set before calling {operation}()")
            }
            Self::InvalidParameters(e) => write!(f, "validating parameters failed: {e}"),
            Self::InvalidGrid { id: Some(id), reason } => {
                write!(f, "validating grid [{id}] failed: {reason}")
            }
            Self::InvalidGrid { id: None, reason } => write!(f, "validating grid failed: {reason}"),
            Self::OutOfDomain(e) => write!(f, "{e}"),
            Self::AlreadyRegistered { id } => write!(f, "grid [{id}] has been set already"),
            Self::Allocation { key, reason } => {
                write!(f, "allocating hierarchy array \"{key}\" failed: {reason}")
            }
            Self::Runtime(e) => write!(f, "{e}"),
            Self::IncompleteHierarchy { missing } => {
                write!(f, "{} grid(s) not registered", missing.len())?;
                if let Some(first) = missing.first() {
                    write!(f, ", first missing id [{first}]")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidParameters(e) => Some(e),
            Self::InvalidGrid { reason, .. } => Some(reason),
            Self::OutOfDomain(e) => Some(e),
            Self::Allocation { reason, .. } => Some(reason),
            Self::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DomainError> for RegistryError {
    fn from(e: DomainError) -> Self {
        Self::OutOfDomain(e)
    }
}

impl From<RuntimeError> for RegistryError {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_taxonomy() {
        let cases = [
            (
                RegistryError::NotInitialized {
                    operation: "add_grid",
                },
                ErrorKind::Sequence,
            ),
            (
                RegistryError::ParametersNotSet {
                    operation: "add_grid",
                },
                ErrorKind::Sequence,
            ),
            (
                RegistryError::InvalidGrid {
                    id: Some(3),
                    reason: ValidationError::Unset {
                        field: "level",
                        component: None,
                    },
                },
                ErrorKind::Validation,
            ),
            (
                RegistryError::OutOfDomain(DomainError::IdOutOfRange {
                    id: 4,
                    num_grids: 4,
                }),
                ErrorKind::Domain,
            ),
            (RegistryError::AlreadyRegistered { id: 0 }, ErrorKind::Duplicate),
            (
                RegistryError::Allocation {
                    key: "grid_levels",
                    reason: RuntimeError::Backend {
                        reason: "oom".into(),
                    },
                },
                ErrorKind::Allocation,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn unset_component_message() {
        let e = ValidationError::Unset {
            field: "left_edge",
            component: Some(2),
        };
        assert_eq!(e.to_string(), "\"left_edge[2]\" has not been set");
    }

    #[test]
    fn grid_error_names_id_and_exposes_source() {
        let e = RegistryError::InvalidGrid {
            id: Some(7),
            reason: ValidationError::OutOfRange {
                field: "level",
                component: None,
                value: -1,
                requirement: ">= 0",
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("grid [7]"));
        assert!(msg.contains("\"level\" == -1"));
        assert!(e.source().is_some());
    }

    #[test]
    fn incomplete_hierarchy_reports_first_missing() {
        let e = RegistryError::IncompleteHierarchy {
            missing: vec![2, 5],
        };
        assert_eq!(e.to_string(), "2 grid(s) not registered, first missing id [2]");
    }
}
