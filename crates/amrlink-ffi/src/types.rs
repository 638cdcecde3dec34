//! C-compatible input structs, enums and sentinel constants.

use std::ffi::{c_char, c_void};

/// Marks a floating-point member as unset. Equal to C's `FLT_MIN`.
pub const AMRLINK_FLT_UNDEFINED: f64 = 1.1754943508222875e-38;

/// Marks an integer member as unset. Equal to C's `INT_MIN`.
pub const AMRLINK_INT_UNDEFINED: i32 = -2147483648;

/// Log verbosity accepted by `amrlink_init`.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmrlinkVerbosity {
    /// Errors only.
    Off = 0,
    /// Progress milestones.
    Info = 1,
    /// Milestones plus overwrite warnings.
    Warning = 2,
    /// Everything.
    Debug = 3,
}

/// Element type of a grid's field buffers.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmrlinkFieldType {
    /// Not set.
    Unknown = 0,
    /// 32-bit float.
    Float = 1,
    /// 64-bit float.
    Double = 2,
}

/// Simulation parameters for `amrlink_set_parameters`.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct AmrlinkParameters {
    /// NUL-terminated frontend name. Required.
    pub frontend: *const c_char,
    /// NUL-terminated output basename, or null for the default.
    pub fig_basename: *const c_char,
    /// Simulation time in code units.
    pub current_time: f64,
    /// Redshift (cosmological runs only).
    pub current_redshift: f64,
    /// Dark-energy density (cosmological runs only).
    pub omega_lambda: f64,
    /// Matter density (cosmological runs only).
    pub omega_matter: f64,
    /// Dimensionless Hubble constant (cosmological runs only).
    pub hubble_constant: f64,
    /// Length unit in cgs.
    pub length_unit: f64,
    /// Mass unit in cgs.
    pub mass_unit: f64,
    /// Time unit in cgs.
    pub time_unit: f64,
    /// Nonzero for a cosmological run.
    pub cosmological_simulation: i32,
    /// Number of spatial dimensions, 1 to 3.
    pub dimensionality: i32,
    /// Lower corner of the domain.
    pub domain_left_edge: [f64; 3],
    /// Upper corner of the domain.
    pub domain_right_edge: [f64; 3],
    /// Periodic flag per axis.
    pub periodicity: [i32; 3],
    /// Root-level cells per axis.
    pub domain_dimensions: [i64; 3],
    /// Total number of grids across all processes.
    pub num_grids: i64,
}

/// One grid for `amrlink_add_grid`.
///
/// Initialize with `amrlink_grid_default`, which sets every member to its
/// unset sentinel, then fill in what the grid has.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct AmrlinkGrid {
    /// Lower corner.
    pub left_edge: [f64; 3],
    /// Upper corner.
    pub right_edge: [f64; 3],
    /// Number of particles.
    pub particle_count: i64,
    /// Global grid id.
    pub id: i64,
    /// Parent id, -1 for root-level grids.
    pub parent_id: i64,
    /// Cells per axis.
    pub dimensions: [i32; 3],
    /// Refinement level.
    pub level: i32,
    /// Number of entries in `field_labels` and `field_data`.
    pub num_fields: i32,
    /// `num_fields` NUL-terminated labels.
    pub field_labels: *const *const c_char,
    /// `num_fields` buffers, each `dimensions[0] * dimensions[1] *
    /// dimensions[2]` elements of `field_ftype`, which must stay valid
    /// while analysis may read them.
    pub field_data: *const *mut c_void,
    /// An [`AmrlinkFieldType`] code.
    pub field_ftype: i32,
}

impl Default for AmrlinkGrid {
    fn default() -> Self {
        let int = i64::from(AMRLINK_INT_UNDEFINED);
        Self {
            left_edge: [AMRLINK_FLT_UNDEFINED; 3],
            right_edge: [AMRLINK_FLT_UNDEFINED; 3],
            particle_count: int,
            id: int,
            parent_id: int,
            dimensions: [AMRLINK_INT_UNDEFINED; 3],
            level: AMRLINK_INT_UNDEFINED,
            num_fields: AMRLINK_INT_UNDEFINED,
            field_labels: std::ptr::null(),
            field_data: std::ptr::null(),
            field_ftype: AmrlinkFieldType::Unknown as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_match_c_limits() {
        assert_eq!(AMRLINK_FLT_UNDEFINED, f64::from(f32::MIN_POSITIVE));
        assert_eq!(AMRLINK_INT_UNDEFINED, i32::MIN);
    }

    #[test]
    fn default_grid_is_all_unset() {
        let g = AmrlinkGrid::default();
        assert_eq!(g.left_edge, [AMRLINK_FLT_UNDEFINED; 3]);
        assert_eq!(g.id, i64::from(i32::MIN));
        assert_eq!(g.level, i32::MIN);
        assert!(g.field_labels.is_null());
        assert_eq!(g.field_ftype, 0);
    }
}
