//! The per-grid record a simulation registers, and its local validator.

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::field::{FieldPtr, FieldType};

/// Description of one local grid of the AMR hierarchy.
///
/// Every member starts unset (`None`); [`validate`](GridRecord::validate)
/// reports the first member that was left unset or is out of range. The
/// record borrows nothing: labels are owned strings and field buffers are
/// plain [`FieldPtr`] addresses whose memory contract the caller accepted
/// when creating them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GridRecord {
    /// Lower corner in code units.
    pub left_edge: [Option<f64>; 3],
    /// Upper corner in code units.
    pub right_edge: [Option<f64>; 3],
    /// Cell count along each axis.
    pub dimensions: [Option<i32>; 3],
    /// Number of particles in this grid.
    pub particle_count: Option<i64>,
    /// Global grid id, 0-indexed across the whole hierarchy.
    pub id: Option<i64>,
    /// Parent grid id; -1 for root-level grids.
    pub parent_id: Option<i64>,
    /// Refinement level; 0 is the root level.
    pub level: Option<i32>,
    /// Number of fields carried by the grid.
    pub num_fields: Option<i32>,
    /// Name of each field.
    pub field_labels: Option<Vec<String>>,
    /// Buffer of each field, in label order.
    pub field_data: Option<Vec<FieldPtr>>,
    /// Element type shared by every field buffer.
    pub field_ftype: Option<FieldType>,
}

impl GridRecord {
    /// An all-unset record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set id, parent id and level.
    pub fn with_topology(mut self, id: i64, parent_id: i64, level: i32) -> Self {
        self.id = Some(id);
        self.parent_id = Some(parent_id);
        self.level = Some(level);
        self
    }

    /// Set both corners.
    pub fn with_edges(mut self, left: [f64; 3], right: [f64; 3]) -> Self {
        self.left_edge = left.map(Some);
        self.right_edge = right.map(Some);
        self
    }

    /// Set the cell count along each axis.
    pub fn with_dimensions(mut self, dimensions: [i32; 3]) -> Self {
        self.dimensions = dimensions.map(Some);
        self
    }

    /// Set the particle count.
    pub fn with_particle_count(mut self, count: i64) -> Self {
        self.particle_count = Some(count);
        self
    }

    /// Set the fields, their buffers and the shared element type.
    ///
    /// `num_fields` is taken from the number of pairs.
    pub fn with_fields<L, I>(mut self, ftype: FieldType, fields: I) -> Self
    where
        L: Into<String>,
        I: IntoIterator<Item = (L, FieldPtr)>,
    {
        let (labels, data): (Vec<String>, Vec<FieldPtr>) =
            fields.into_iter().map(|(l, p)| (l.into(), p)).unzip();
        self.num_fields = Some(i32::try_from(labels.len()).unwrap_or(i32::MAX));
        self.field_labels = Some(labels);
        self.field_data = Some(data);
        self.field_ftype = Some(ftype);
        self
    }

    /// Check every member that can be judged without global state.
    ///
    /// Checks run in a fixed order and the first failure wins: presence of
    /// the geometry vectors, presence of the scalar and field members, range
    /// of the integer members, then consistency of the field lists and
    /// edges. Domain bounds and `num_grids` are the registrar's concern.
    pub fn validate(&self) -> Result<(), ValidationError> {
        // 1. Geometry presence.
        for (field, v) in [("left_edge", &self.left_edge), ("right_edge", &self.right_edge)] {
            if let Some(d) = v.iter().position(Option::is_none) {
                return Err(unset(field, Some(d)));
            }
        }
        if let Some(d) = self.dimensions.iter().position(Option::is_none) {
            return Err(unset("dimensions", Some(d)));
        }

        // 2. Scalar and field presence.
        let particle_count = self.particle_count.ok_or(unset("particle_count", None))?;
        let id = self.id.ok_or(unset("id", None))?;
        self.parent_id.ok_or(unset("parent_id", None))?;
        let level = self.level.ok_or(unset("level", None))?;
        let num_fields = self.num_fields.ok_or(unset("num_fields", None))?;
        let labels = self.field_labels.as_deref().ok_or(unset("field_labels", None))?;
        let data = self.field_data.as_deref().ok_or(unset("field_data", None))?;
        self.field_ftype.ok_or(unset("field_ftype", None))?;

        // 3. Ranges. `field_ftype` is a closed enum, so only presence matters.
        for (d, dim) in self.dimensions.iter().flatten().enumerate() {
            if *dim <= 0 {
                return Err(out_of_range("dimensions", Some(d), (*dim).into(), "> 0"));
            }
        }
        if particle_count < 0 {
            return Err(out_of_range("particle_count", None, particle_count, ">= 0"));
        }
        if id < 0 {
            return Err(out_of_range("id", None, id, ">= 0"));
        }
        if level < 0 {
            return Err(out_of_range("level", None, level.into(), ">= 0"));
        }
        if num_fields <= 0 {
            return Err(out_of_range("num_fields", None, num_fields.into(), "> 0"));
        }

        // 4. Field list and edge consistency.
        let expected = num_fields as usize;
        for (field, actual) in [("field_labels", labels.len()), ("field_data", data.len())] {
            if actual != expected {
                return Err(ValidationError::FieldCountMismatch {
                    field,
                    expected,
                    actual,
                });
            }
        }
        let mut seen = HashSet::with_capacity(expected);
        for (index, label) in labels.iter().enumerate() {
            if label.is_empty() {
                return Err(ValidationError::EmptyLabel { index });
            }
            if !seen.insert(label.as_str()) {
                return Err(ValidationError::DuplicateLabel {
                    label: label.clone(),
                });
            }
        }
        if let Some(index) = data.iter().position(|p| p.is_null()) {
            return Err(ValidationError::NullFieldData { index });
        }
        for d in 0..3 {
            let left = self.left_edge[d].unwrap_or_default();
            let right = self.right_edge[d].unwrap_or_default();
            if !left.is_finite() {
                return Err(invalid_float("left_edge", d, left, "finite"));
            }
            if !right.is_finite() {
                return Err(invalid_float("right_edge", d, right, "finite"));
            }
            if right < left {
                return Err(invalid_float("right_edge", d, right, ">= left_edge"));
            }
        }
        Ok(())
    }

    /// Validate, then return the record with every member unwrapped.
    pub fn validated(&self) -> Result<ValidGrid<'_>, ValidationError> {
        self.validate()?;
        Ok(ValidGrid {
            id: self.id.unwrap_or_default(),
            parent_id: self.parent_id.unwrap_or_default(),
            level: self.level.unwrap_or_default(),
            particle_count: self.particle_count.unwrap_or_default(),
            left_edge: self.left_edge.map(Option::unwrap_or_default),
            right_edge: self.right_edge.map(Option::unwrap_or_default),
            dimensions: self.dimensions.map(Option::unwrap_or_default),
            field_labels: self.field_labels.as_deref().unwrap_or_default(),
            field_data: self.field_data.as_deref().unwrap_or_default(),
            field_ftype: self.field_ftype.unwrap_or(FieldType::Double),
        })
    }
}

/// A [`GridRecord`] that passed [`validate`](GridRecord::validate).
#[derive(Clone, Copy, Debug)]
pub struct ValidGrid<'g> {
    /// Global grid id, `>= 0`.
    pub id: i64,
    /// Parent grid id.
    pub parent_id: i64,
    /// Refinement level, `>= 0`.
    pub level: i32,
    /// Particle count, `>= 0`.
    pub particle_count: i64,
    /// Lower corner.
    pub left_edge: [f64; 3],
    /// Upper corner.
    pub right_edge: [f64; 3],
    /// Positive cell counts.
    pub dimensions: [i32; 3],
    /// Unique, non-empty labels, one per field.
    pub field_labels: &'g [String],
    /// Non-null buffers, one per field.
    pub field_data: &'g [FieldPtr],
    /// Element type of every buffer.
    pub field_ftype: FieldType,
}

impl ValidGrid<'_> {
    /// Cell counts as array extents.
    pub fn shape(&self) -> [usize; 3] {
        self.dimensions.map(|d| usize::try_from(d).unwrap_or(0))
    }
}

fn unset(field: &'static str, component: Option<usize>) -> ValidationError {
    ValidationError::Unset { field, component }
}

fn out_of_range(
    field: &'static str,
    component: Option<usize>,
    value: i64,
    requirement: &'static str,
) -> ValidationError {
    ValidationError::OutOfRange {
        field,
        component,
        value,
        requirement,
    }
}

fn invalid_float(
    field: &'static str,
    d: usize,
    value: f64,
    requirement: &'static str,
) -> ValidationError {
    ValidationError::InvalidFloat {
        field,
        component: Some(d),
        value,
        requirement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Address-only pointer; validation never dereferences.
    #[allow(unsafe_code)]
    fn fake_ptr(addr: usize) -> FieldPtr {
        unsafe { FieldPtr::new(addr as *mut std::ffi::c_void) }
    }

    fn valid_grid() -> GridRecord {
        GridRecord::new()
            .with_topology(0, -1, 0)
            .with_edges([0.0; 3], [0.5, 1.0, 1.0])
            .with_dimensions([8, 8, 8])
            .with_particle_count(0)
            .with_fields(
                FieldType::Double,
                [("density", fake_ptr(0x1000)), ("temperature", fake_ptr(0x2000))],
            )
    }

    #[test]
    fn valid_grid_passes() {
        assert_eq!(valid_grid().validate(), Ok(()));
    }

    #[test]
    fn empty_record_reports_left_edge_first() {
        assert_eq!(
            GridRecord::new().validate(),
            Err(ValidationError::Unset {
                field: "left_edge",
                component: Some(0),
            })
        );
    }

    #[test]
    fn missing_component_is_named() {
        let mut g = valid_grid();
        g.dimensions[2] = None;
        assert_eq!(
            g.validate(),
            Err(ValidationError::Unset {
                field: "dimensions",
                component: Some(2),
            })
        );
    }

    #[test]
    fn presence_checks_precede_range_checks() {
        let mut g = valid_grid();
        g.id = Some(-5);
        g.field_ftype = None;
        assert_eq!(
            g.validate(),
            Err(ValidationError::Unset {
                field: "field_ftype",
                component: None,
            })
        );
    }

    #[test]
    fn negative_values_rejected() {
        let cases: [(fn(&mut GridRecord), &str); 4] = [
            (|g| g.particle_count = Some(-1), "particle_count"),
            (|g| g.id = Some(-1), "id"),
            (|g| g.level = Some(-1), "level"),
            (|g| g.dimensions[1] = Some(0), "dimensions"),
        ];
        for (mutate, name) in cases {
            let mut g = valid_grid();
            mutate(&mut g);
            match g.validate() {
                Err(ValidationError::OutOfRange { field, .. }) if field == name => {}
                other => panic!("expected {name} out of range, got {other:?}"),
            }
        }
    }

    #[test]
    fn zero_fields_rejected() {
        let g = valid_grid().with_fields(FieldType::Float, Vec::<(String, FieldPtr)>::new());
        assert!(matches!(
            g.validate(),
            Err(ValidationError::OutOfRange {
                field: "num_fields",
                ..
            })
        ));
    }

    #[test]
    fn label_and_pointer_lists_must_match_num_fields() {
        let mut g = valid_grid();
        g.num_fields = Some(3);
        assert_eq!(
            g.validate(),
            Err(ValidationError::FieldCountMismatch {
                field: "field_labels",
                expected: 3,
                actual: 2,
            })
        );
    }

    #[test]
    fn duplicate_label_rejected() {
        let g = valid_grid().with_fields(
            FieldType::Double,
            [("density", fake_ptr(0x1000)), ("density", fake_ptr(0x2000))],
        );
        assert_eq!(
            g.validate(),
            Err(ValidationError::DuplicateLabel {
                label: "density".into(),
            })
        );
    }

    #[test]
    fn null_buffer_rejected() {
        let g = valid_grid().with_fields(
            FieldType::Double,
            [("density", fake_ptr(0x1000)), ("pressure", FieldPtr::null())],
        );
        assert_eq!(g.validate(), Err(ValidationError::NullFieldData { index: 1 }));
    }

    #[test]
    fn inverted_edges_rejected() {
        let g = valid_grid().with_edges([0.5, 0.0, 0.0], [0.25, 1.0, 1.0]);
        assert!(matches!(
            g.validate(),
            Err(ValidationError::InvalidFloat {
                field: "right_edge",
                component: Some(0),
                ..
            })
        ));
    }

    #[test]
    fn validation_ignores_global_bounds() {
        // Far outside any plausible domain and with a huge id: still locally valid.
        let g = valid_grid()
            .with_topology(1 << 40, 1 << 39, 7)
            .with_edges([-1e30; 3], [1e30; 3]);
        assert_eq!(g.validate(), Ok(()));
    }

    #[test]
    fn validated_unwraps_members() {
        let g = valid_grid().with_dimensions([4, 2, 1]);
        let v = g.validated().unwrap();
        assert_eq!(v.shape(), [4, 2, 1]);
        assert_eq!(v.parent_id, -1);
        assert_eq!(v.field_labels, ["density", "temperature"]);
        assert_eq!(v.field_data.len(), 2);
    }

    #[test]
    fn validated_propagates_failure() {
        let mut g = valid_grid();
        g.level = None;
        assert!(g.validated().is_err());
    }

    proptest! {
        #[test]
        fn positive_dimensions_always_pass(d0 in 1i32..512, d1 in 1i32..512, d2 in 1i32..512) {
            let g = valid_grid().with_dimensions([d0, d1, d2]);
            prop_assert_eq!(g.validate(), Ok(()));
        }

        #[test]
        fn any_nonpositive_dimension_fails(axis in 0usize..3, bad in -1000i32..=0) {
            let mut g = valid_grid();
            g.dimensions[axis] = Some(bad);
            let failed_on_dimensions = matches!(
                g.validate(),
                Err(ValidationError::OutOfRange { field: "dimensions", component: Some(a), .. }) if a == axis
            );
            prop_assert!(failed_on_dimensions);
        }
    }
}
