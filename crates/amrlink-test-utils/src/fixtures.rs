//! Parameter and grid fixtures.
//!
//! [`OwnedGrid`] keeps its field buffers alive on the heap, so the
//! [`FieldPtr`]s handed out by [`OwnedGrid::record`] stay valid for as long
//! as the fixture does, wherever it is moved.

use amrlink_core::{FieldPtr, FieldType, GridRecord, SimulationParameters};

/// Valid one-dimensional parameters over the domain `[0, 1]`.
pub fn params_1d(num_grids: i64) -> SimulationParameters {
    SimulationParameters {
        frontend: "gamer".to_string(),
        dimensionality: 1,
        domain_left_edge: [0.0; 3],
        domain_right_edge: [1.0, 0.0, 0.0],
        domain_dimensions: [16, 1, 1],
        num_grids,
        ..SimulationParameters::default()
    }
}

/// Valid three-dimensional parameters over the unit cube.
pub fn params_3d(num_grids: i64) -> SimulationParameters {
    SimulationParameters {
        frontend: "gamer".to_string(),
        dimensionality: 3,
        domain_left_edge: [0.0; 3],
        domain_right_edge: [1.0; 3],
        periodicity: [1, 1, 1],
        domain_dimensions: [16, 16, 16],
        num_grids,
        ..SimulationParameters::default()
    }
}

/// A grid whose double-precision field buffers are owned by the fixture.
///
/// Element `i` of field `f` starts out as `id * 100 + f + i / 1000`, which
/// makes every buffer distinguishable.
#[derive(Clone, Debug)]
pub struct OwnedGrid {
    pub id: i64,
    pub parent_id: i64,
    pub level: i32,
    pub left_edge: [f64; 3],
    pub right_edge: [f64; 3],
    pub dimensions: [i32; 3],
    pub particle_count: i64,
    labels: Vec<String>,
    buffers: Vec<Vec<f64>>,
}

impl OwnedGrid {
    /// A root-level grid (level 0, parent -1).
    pub fn root(
        id: i64,
        left_edge: [f64; 3],
        right_edge: [f64; 3],
        dimensions: [i32; 3],
        labels: &[&str],
    ) -> Self {
        let cells: usize = dimensions
            .iter()
            .map(|&d| usize::try_from(d).unwrap_or(0))
            .product();
        let buffers = (0..labels.len())
            .map(|f| {
                (0..cells)
                    .map(|i| (id * 100) as f64 + f as f64 + i as f64 / 1000.0)
                    .collect()
            })
            .collect();
        Self {
            id,
            parent_id: -1,
            level: 0,
            left_edge,
            right_edge,
            dimensions,
            particle_count: 0,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            buffers,
        }
    }

    /// Re-parent the grid at `level`.
    pub fn child_of(mut self, parent_id: i64, level: i32) -> Self {
        self.parent_id = parent_id;
        self.level = level;
        self
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn buffer(&self, field: usize) -> &[f64] {
        &self.buffers[field]
    }

    pub fn buffer_mut(&mut self, field: usize) -> &mut [f64] {
        &mut self.buffers[field]
    }

    /// A fully populated record pointing at this fixture's buffers.
    #[allow(unsafe_code)]
    pub fn record(&mut self) -> GridRecord {
        let fields: Vec<(String, FieldPtr)> = self
            .labels
            .iter()
            .cloned()
            .zip(self.buffers.iter_mut().map(|b| {
                // SAFETY: each buffer holds `product(dimensions)` f64s and
                // lives on the heap for as long as the fixture.
                unsafe { FieldPtr::new(b.as_mut_ptr().cast()) }
            }))
            .collect();
        GridRecord::new()
            .with_topology(self.id, self.parent_id, self.level)
            .with_edges(self.left_edge, self.right_edge)
            .with_dimensions(self.dimensions)
            .with_particle_count(self.particle_count)
            .with_fields(FieldType::Double, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_parameters_are_valid() {
        assert!(params_1d(2).validate().is_ok());
        assert!(params_3d(8).validate().is_ok());
    }

    #[test]
    fn record_passes_validation_and_points_at_buffers() {
        let mut g = OwnedGrid::root(2, [0.0; 3], [0.5; 3], [2, 2, 2], &["density", "vx"]);
        let record = g.record();
        assert_eq!(record.validate(), Ok(()));
        let data = record.field_data.unwrap();
        assert_eq!(data[1].as_ptr(), g.buffer_mut(1).as_mut_ptr().cast());
        assert_eq!(g.buffer(1)[0], 201.0);
    }
}
