//! C struct -> core type conversion.
//!
//! Sentinel members become `None`; validation of what remains is the
//! engine's job.

use std::ffi::{c_char, CStr};

use amrlink_core::{FieldPtr, FieldType, GridRecord, SimulationParameters, ValidationError};

use crate::types::{
    AmrlinkFieldType, AmrlinkGrid, AmrlinkParameters, AMRLINK_FLT_UNDEFINED,
    AMRLINK_INT_UNDEFINED,
};

fn float(v: f64) -> Option<f64> {
    (v != AMRLINK_FLT_UNDEFINED).then_some(v)
}

fn int32(v: i32) -> Option<i32> {
    (v != AMRLINK_INT_UNDEFINED).then_some(v)
}

fn int64(v: i64) -> Option<i64> {
    (v != i64::from(AMRLINK_INT_UNDEFINED)).then_some(v)
}

/// Copy a nullable C string. Null yields `None`.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
#[allow(unsafe_code)]
pub(crate) unsafe fn optional_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per caller contract.
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Map an [`AmrlinkFieldType`] code.
///
/// `Unknown` means unset; any other unrecognized code is a validation
/// failure.
pub(crate) fn field_type(code: i32) -> Result<Option<FieldType>, ValidationError> {
    match code {
        x if x == AmrlinkFieldType::Unknown as i32 => Ok(None),
        x if x == AmrlinkFieldType::Float as i32 => Ok(Some(FieldType::Float)),
        x if x == AmrlinkFieldType::Double as i32 => Ok(Some(FieldType::Double)),
        value => Err(ValidationError::OutOfRange {
            field: "field_ftype",
            component: None,
            value: value.into(),
            requirement: "a known field type",
        }),
    }
}

/// Build [`SimulationParameters`] from the C struct.
///
/// A null `frontend` becomes an empty name, which validation rejects.
///
/// # Safety
///
/// `frontend` and `fig_basename` must each be null or NUL-terminated.
#[allow(unsafe_code)]
pub(crate) unsafe fn parameters(raw: &AmrlinkParameters) -> SimulationParameters {
    SimulationParameters {
        // SAFETY: forwarded caller contract.
        frontend: unsafe { optional_str(raw.frontend) }.unwrap_or_default(),
        fig_basename: unsafe { optional_str(raw.fig_basename) },
        current_time: raw.current_time,
        current_redshift: raw.current_redshift,
        omega_lambda: raw.omega_lambda,
        omega_matter: raw.omega_matter,
        hubble_constant: raw.hubble_constant,
        length_unit: raw.length_unit,
        mass_unit: raw.mass_unit,
        time_unit: raw.time_unit,
        cosmological_simulation: raw.cosmological_simulation != 0,
        dimensionality: raw.dimensionality,
        domain_left_edge: raw.domain_left_edge,
        domain_right_edge: raw.domain_right_edge,
        periodicity: raw.periodicity,
        domain_dimensions: raw.domain_dimensions,
        num_grids: raw.num_grids,
    }
}

/// Build a [`GridRecord`] from the C struct.
///
/// The label and buffer lists are read only when their pointer is
/// non-null and `num_fields` is set and positive; otherwise they stay
/// unset. A null label is read as an empty one.
///
/// # Safety
///
/// When non-null, `field_labels` and `field_data` must each point to
/// `num_fields` entries, and every non-null label must be NUL-terminated.
/// Each buffer must satisfy the contract of [`FieldPtr::new`].
#[allow(unsafe_code)]
pub(crate) unsafe fn grid(raw: &AmrlinkGrid) -> Result<GridRecord, ValidationError> {
    let field_ftype = field_type(raw.field_ftype)?;
    let count = int32(raw.num_fields)
        .and_then(|n| usize::try_from(n).ok())
        .filter(|&n| n > 0);

    let field_labels = match count {
        Some(n) if !raw.field_labels.is_null() => {
            // SAFETY: `n` entries per caller contract.
            let ptrs = unsafe { std::slice::from_raw_parts(raw.field_labels, n) };
            Some(
                ptrs.iter()
                    .map(|&p| unsafe { optional_str(p) }.unwrap_or_default())
                    .collect(),
            )
        }
        _ => None,
    };
    let field_data = match count {
        Some(n) if !raw.field_data.is_null() => {
            // SAFETY: `n` entries per caller contract.
            let ptrs = unsafe { std::slice::from_raw_parts(raw.field_data, n) };
            Some(ptrs.iter().map(|&p| unsafe { FieldPtr::new(p) }).collect())
        }
        _ => None,
    };

    Ok(GridRecord {
        left_edge: raw.left_edge.map(float),
        right_edge: raw.right_edge.map(float),
        dimensions: raw.dimensions.map(int32),
        particle_count: int64(raw.particle_count),
        id: int64(raw.id),
        parent_id: int64(raw.parent_id),
        level: int32(raw.level),
        num_fields: int32(raw.num_fields),
        field_labels,
        field_data,
        field_ftype,
    })
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::ffi::{c_void, CString};

    #[test]
    fn sentinels_become_unset() {
        let record = unsafe { grid(&AmrlinkGrid::default()) }.unwrap();
        assert_eq!(record, GridRecord::new());
    }

    #[test]
    fn unknown_ftype_code_rejected() {
        let raw = AmrlinkGrid {
            field_ftype: 7,
            ..AmrlinkGrid::default()
        };
        match unsafe { grid(&raw) } {
            Err(ValidationError::OutOfRange {
                field: "field_ftype",
                value: 7,
                ..
            }) => {}
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn populated_grid_converts() {
        let label = CString::new("density").unwrap();
        let labels = [label.as_ptr()];
        let mut buf = [0.0f64; 8];
        let data = [buf.as_mut_ptr().cast::<c_void>()];
        let raw = AmrlinkGrid {
            left_edge: [0.0; 3],
            right_edge: [0.5; 3],
            particle_count: 3,
            id: 1,
            parent_id: -1,
            dimensions: [2, 2, 2],
            level: 0,
            num_fields: 1,
            field_labels: labels.as_ptr(),
            field_data: data.as_ptr(),
            field_ftype: AmrlinkFieldType::Double as i32,
        };
        let record = unsafe { grid(&raw) }.unwrap();
        let valid = record.validated().unwrap();
        assert_eq!(valid.id, 1);
        assert_eq!(valid.field_labels, ["density"]);
        assert_eq!(valid.field_data[0].as_ptr(), data[0]);
        assert_eq!(valid.field_ftype, FieldType::Double);
    }

    #[test]
    fn null_label_reads_as_empty() {
        let labels = [std::ptr::null::<c_char>()];
        let raw = AmrlinkGrid {
            num_fields: 1,
            field_labels: labels.as_ptr(),
            ..AmrlinkGrid::default()
        };
        let record = unsafe { grid(&raw) }.unwrap();
        assert_eq!(record.field_labels, Some(vec![String::new()]));
        assert_eq!(record.field_data, None);
    }

    #[test]
    fn null_strings_in_parameters() {
        let raw = AmrlinkParameters {
            frontend: std::ptr::null(),
            fig_basename: std::ptr::null(),
            current_time: 0.5,
            current_redshift: 0.0,
            omega_lambda: 0.0,
            omega_matter: 0.0,
            hubble_constant: 0.0,
            length_unit: 1.0,
            mass_unit: 1.0,
            time_unit: 1.0,
            cosmological_simulation: 0,
            dimensionality: 3,
            domain_left_edge: [0.0; 3],
            domain_right_edge: [1.0; 3],
            periodicity: [1; 3],
            domain_dimensions: [8; 3],
            num_grids: 1,
        };
        let p = unsafe { parameters(&raw) };
        assert!(p.frontend.is_empty());
        assert_eq!(p.fig_basename, None);
        assert!(!p.cosmological_simulation);
        assert!(p.validate().is_err());
    }

    proptest! {
        #[test]
        fn codes_outside_known_types_rejected(
            code in any::<i32>().prop_filter("known code", |c| !(0..=2).contains(c)),
        ) {
            match field_type(code) {
                Err(ValidationError::OutOfRange { field: "field_ftype", value, .. }) => {
                    prop_assert_eq!(value, i64::from(code));
                }
                other => prop_assert!(false, "expected OutOfRange, got {:?}", other),
            }
        }

        #[test]
        fn set_members_pass_through(
            id in 0i64..1 << 40,
            parent in 0i64..1 << 40,
            level in 0i32..64,
            particles in 0i64..1 << 40,
            left in prop::array::uniform3(-1.0e6f64..1.0e6),
            dims in prop::array::uniform3(1i32..4096),
        ) {
            let raw = AmrlinkGrid {
                id,
                parent_id: parent,
                level,
                particle_count: particles,
                left_edge: left,
                dimensions: dims,
                ..AmrlinkGrid::default()
            };
            let record = unsafe { grid(&raw) }.unwrap();
            prop_assert_eq!(record.id, Some(id));
            prop_assert_eq!(record.parent_id, Some(parent));
            prop_assert_eq!(record.level, Some(level));
            prop_assert_eq!(record.particle_count, Some(particles));
            prop_assert_eq!(record.left_edge, left.map(Some));
            prop_assert_eq!(record.dimensions, dims.map(Some));
            prop_assert_eq!(record.right_edge, [None; 3]);
            prop_assert_eq!(record.num_fields, None);
        }
    }
}
