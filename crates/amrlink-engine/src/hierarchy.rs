//! Hierarchy arrays: one row per global grid id.
//!
//! Six numeric arrays are published in the `hierarchy` container, each
//! shaped `[num_grids, width]`:
//!
//! | key                   | dtype   | width |
//! |-----------------------|---------|-------|
//! | `grid_left_edge`      | float64 | 3     |
//! | `grid_right_edge`     | float64 | 3     |
//! | `grid_dimensions`     | int64   | 3     |
//! | `grid_particle_count` | int64   | 1     |
//! | `grid_parent_id`      | int64   | 1     |
//! | `grid_levels`         | int64   | 1     |
//!
//! Row `i` is written when grid `i` is registered; until then its content
//! is unspecified.

use amrlink_core::{ArrayHandle, ContainerHandle, DType, Key, RegistryError, Runtime};
use tracing::{debug, warn};

use crate::registry::Registry;

/// One hierarchy array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HierarchyColumn {
    /// Lower corner of each grid.
    LeftEdge = 0,
    /// Upper corner of each grid.
    RightEdge = 1,
    /// Cell counts of each grid.
    Dimensions = 2,
    /// Particle count of each grid.
    ParticleCount = 3,
    /// Parent id of each grid.
    ParentId = 4,
    /// Refinement level of each grid.
    Level = 5,
}

impl HierarchyColumn {
    /// Every column, in allocation order.
    pub const ALL: [Self; 6] = [
        Self::LeftEdge,
        Self::RightEdge,
        Self::Dimensions,
        Self::ParticleCount,
        Self::ParentId,
        Self::Level,
    ];

    /// Key under which the array is published.
    pub fn key(self) -> &'static str {
        match self {
            Self::LeftEdge => "grid_left_edge",
            Self::RightEdge => "grid_right_edge",
            Self::Dimensions => "grid_dimensions",
            Self::ParticleCount => "grid_particle_count",
            Self::ParentId => "grid_parent_id",
            Self::Level => "grid_levels",
        }
    }

    /// Number of columns per row.
    pub fn width(self) -> usize {
        match self {
            Self::LeftEdge | Self::RightEdge | Self::Dimensions => 3,
            Self::ParticleCount | Self::ParentId | Self::Level => 1,
        }
    }

    /// Element type.
    pub fn dtype(self) -> DType {
        match self {
            Self::LeftEdge | Self::RightEdge => DType::F64,
            _ => DType::I64,
        }
    }
}

/// Handles of the six allocated hierarchy arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HierarchyTable {
    arrays: [ArrayHandle; 6],
    rows: usize,
}

impl HierarchyTable {
    /// Handle of one column's array.
    pub fn array(&self, column: HierarchyColumn) -> ArrayHandle {
        self.arrays[column as usize]
    }

    /// Number of rows, i.e. `num_grids`.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl<R: Runtime> Registry<R> {
    /// Allocate fresh hierarchy arrays for `rows` grids.
    ///
    /// Existing hierarchy arrays and grid data are discarded first. A
    /// failed array creation aborts with [`RegistryError::Allocation`]
    /// naming its key; arrays created before it stay published.
    pub(crate) fn allocate_hierarchy(&mut self, rows: usize) -> Result<(), RegistryError> {
        let roots = self.roots("set_parameters")?;
        let stale = self.hierarchy.is_some() || self.runtime.container_len(roots.hierarchy)? > 0;
        if stale {
            warn!("removing existing hierarchy and grid data, every grid must be added again");
            self.drop_hierarchy();
            self.runtime.clear_container(roots.hierarchy)?;
            self.runtime.clear_container(roots.grid_data)?;
        }

        let mut arrays = [ArrayHandle(0); 6];
        for (created, column) in HierarchyColumn::ALL.into_iter().enumerate() {
            match self.publish_column(roots.hierarchy, column, rows) {
                Ok(array) => arrays[created] = array,
                Err(err) => {
                    for array in &arrays[..created] {
                        self.runtime.release_array(*array);
                    }
                    return Err(err);
                }
            }
        }
        self.hierarchy = Some(HierarchyTable { arrays, rows });
        Ok(())
    }

    fn publish_column(
        &mut self,
        container: ContainerHandle,
        column: HierarchyColumn,
        rows: usize,
    ) -> Result<ArrayHandle, RegistryError> {
        let key = column.key();
        let array = self
            .runtime
            .create_numeric_array([rows, column.width()], column.dtype())
            .map_err(|reason| RegistryError::Allocation { key, reason })?;
        if let Err(reason) = self.runtime.set_array(container, Key::Str(key), array) {
            self.runtime.release_array(array);
            return Err(RegistryError::Allocation { key, reason });
        }
        debug!(key, rows, width = column.width(), "allocated hierarchy array");
        Ok(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_layout() {
        let keys: Vec<_> = HierarchyColumn::ALL.iter().map(|c| c.key()).collect();
        assert_eq!(
            keys,
            [
                "grid_left_edge",
                "grid_right_edge",
                "grid_dimensions",
                "grid_particle_count",
                "grid_parent_id",
                "grid_levels",
            ]
        );
        assert_eq!(HierarchyColumn::Dimensions.width(), 3);
        assert_eq!(HierarchyColumn::Dimensions.dtype(), DType::I64);
        assert_eq!(HierarchyColumn::Level.width(), 1);
        assert_eq!(HierarchyColumn::RightEdge.dtype(), DType::F64);
    }

    #[test]
    fn discriminants_index_all() {
        for (i, column) in HierarchyColumn::ALL.iter().enumerate() {
            assert_eq!(*column as usize, i);
        }
    }
}
