//! The grid registrar: checks one grid against the declared hierarchy, fills
//! its metadata rows and exposes its field buffers.

use amrlink_core::{
    ContainerHandle, DomainError, Element, FieldView, GridRecord, Key, RegistryError, Runtime,
    SimulationParameters, ValidGrid, ValidationError,
};
use tracing::debug;

use crate::hierarchy::{HierarchyColumn, HierarchyTable};
use crate::registry::{report, Registry};

impl<R: Runtime> Registry<R> {
    /// Register one local grid.
    ///
    /// Checks run in order and the first failure is returned: the registry
    /// must be initialized and hold parameters, the record must validate,
    /// its id and parent id must be below `num_grids`, a refined grid must
    /// have a parent, its edges must lie inside the domain along every
    /// active dimension, and its id must not be registered yet. The grid's
    /// row of every hierarchy array is then written and each field buffer
    /// is exposed as `grid_data[id][label]` without copying. A runtime
    /// failure part-way through leaves earlier writes in place and the grid
    /// unregistered.
    pub fn add_grid(&mut self, grid: &GridRecord) -> Result<(), RegistryError> {
        self.try_add_grid(grid).inspect_err(report)
    }

    fn try_add_grid(&mut self, grid: &GridRecord) -> Result<(), RegistryError> {
        let roots = self.roots("add_grid")?;
        let (Some(params), Some(table), true) =
            (&self.params, self.hierarchy, self.state.parameters_set())
        else {
            return Err(RegistryError::ParametersNotSet {
                operation: "add_grid",
            });
        };

        let grid = grid
            .validated()
            .map_err(|reason| RegistryError::InvalidGrid {
                id: grid.id,
                reason,
            })?;
        check_domain(&grid, params)?;
        if self.state.is_set(grid.id) {
            return Err(RegistryError::AlreadyRegistered { id: grid.id });
        }

        let row = usize::try_from(grid.id).unwrap_or_default();
        write_rows(&mut self.runtime, &table, row, &grid)?;
        debug!(grid = grid.id, "inserting grid info into hierarchy ... done");

        expose_fields(&mut self.runtime, roots.grid_data, &grid)?;
        debug!(
            grid = grid.id,
            fields = grid.field_labels.len(),
            "exposing field data ... done"
        );

        self.state.mark_set(row);
        Ok(())
    }
}

/// Check a validated grid against `num_grids` and the simulation domain.
fn check_domain(grid: &ValidGrid<'_>, params: &SimulationParameters) -> Result<(), DomainError> {
    let (id, parent_id, num_grids) = (grid.id, grid.parent_id, params.num_grids);
    if id >= num_grids {
        return Err(DomainError::IdOutOfRange { id, num_grids });
    }
    if parent_id >= num_grids {
        return Err(DomainError::ParentOutOfRange {
            id,
            parent_id,
            num_grids,
        });
    }
    if grid.level > 0 && parent_id < 0 {
        return Err(DomainError::MissingParent {
            id,
            parent_id,
            level: grid.level,
        });
    }
    let active = usize::try_from(params.dimensionality).unwrap_or_default();
    for dim in 0..active.min(3) {
        let (edge, domain) = (grid.left_edge[dim], params.domain_left_edge[dim]);
        if edge < domain {
            return Err(DomainError::LeftEdgeOutside {
                id,
                dim,
                edge,
                domain,
            });
        }
        let (edge, domain) = (grid.right_edge[dim], params.domain_right_edge[dim]);
        if edge > domain {
            return Err(DomainError::RightEdgeOutside {
                id,
                dim,
                edge,
                domain,
            });
        }
    }
    Ok(())
}

fn write_rows<R: Runtime>(
    runtime: &mut R,
    table: &HierarchyTable,
    row: usize,
    grid: &ValidGrid<'_>,
) -> Result<(), RegistryError> {
    let rows: [(HierarchyColumn, Vec<Element>); 6] = [
        (
            HierarchyColumn::LeftEdge,
            grid.left_edge.iter().map(|&v| Element::Float(v)).collect(),
        ),
        (
            HierarchyColumn::RightEdge,
            grid.right_edge.iter().map(|&v| Element::Float(v)).collect(),
        ),
        (
            HierarchyColumn::Dimensions,
            grid.dimensions.iter().map(|&d| Element::Int(d.into())).collect(),
        ),
        (
            HierarchyColumn::ParticleCount,
            vec![Element::Int(grid.particle_count)],
        ),
        (HierarchyColumn::ParentId, vec![Element::Int(grid.parent_id)]),
        (HierarchyColumn::Level, vec![Element::Int(grid.level.into())]),
    ];
    for (column, values) in rows {
        let array = table.array(column);
        for (col, value) in values.into_iter().enumerate() {
            runtime.write_element(array, row, col, value)?;
        }
    }
    Ok(())
}

fn expose_fields<R: Runtime>(
    runtime: &mut R,
    grid_data: ContainerHandle,
    grid: &ValidGrid<'_>,
) -> Result<(), RegistryError> {
    let container = runtime.ensure_nested(grid_data, Key::Int(grid.id))?;
    let result = wrap_fields(runtime, container, grid);
    runtime.release_container(container);
    result
}

fn wrap_fields<R: Runtime>(
    runtime: &mut R,
    container: ContainerHandle,
    grid: &ValidGrid<'_>,
) -> Result<(), RegistryError> {
    let shape = grid.shape();
    for (index, (label, ptr)) in grid.field_labels.iter().zip(grid.field_data).enumerate() {
        let view = FieldView::new(*ptr, shape, grid.field_ftype).ok_or_else(|| {
            RegistryError::InvalidGrid {
                id: Some(grid.id),
                reason: ValidationError::NullFieldData { index },
            }
        })?;
        let array = runtime.wrap_external_buffer(&view)?;
        let stored = runtime.set_array(container, Key::Str(label), array);
        runtime.release_array(array);
        stored?;
    }
    Ok(())
}
