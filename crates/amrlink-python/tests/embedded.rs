//! Integration test: a [`Registry`] publishing into the embedded
//! interpreter, inspected from the Python side.
//!
//! Each test publishes its own module name so that tests running on
//! parallel threads do not share `sys.modules` entries.

use amrlink_engine::{Registry, RegistryConfig};
use amrlink_python::PyRuntime;
use amrlink_test_utils::{params_1d, OwnedGrid};
use pyo3::prelude::*;

fn registry(module: &str) -> Registry<PyRuntime> {
    let config = RegistryConfig {
        module_name: module.to_string(),
        ..RegistryConfig::default()
    };
    let runtime = PyRuntime::new(module).unwrap();
    assert_eq!(runtime.module_name(), module);
    let mut reg = Registry::new(config, runtime).unwrap();
    reg.init().unwrap();
    reg
}

fn left_half() -> OwnedGrid {
    OwnedGrid::root(0, [0.0; 3], [0.5, 0.0, 0.0], [8, 1, 1], &["density"])
}

#[test]
fn hierarchy_arrays_have_wire_dtypes_and_shapes() {
    let mut reg = registry("amrlink_layout");
    reg.set_parameters(params_1d(3)).unwrap();

    reg.runtime()
        .with_module(|module| -> PyResult<()> {
            let hierarchy = module.getattr("hierarchy")?;
            for (key, width, dtype) in [
                ("grid_left_edge", 3, "float64"),
                ("grid_right_edge", 3, "float64"),
                ("grid_dimensions", 3, "int64"),
                ("grid_particle_count", 1, "int64"),
                ("grid_parent_id", 1, "int64"),
                ("grid_levels", 1, "int64"),
            ] {
                let array = hierarchy.get_item(key)?;
                let shape: (usize, usize) = array.getattr("shape")?.extract()?;
                let name: String = array.getattr("dtype")?.getattr("name")?.extract()?;
                assert_eq!(shape, (3, width), "{key}");
                assert_eq!(name, dtype, "{key}");
            }

            let param = module.getattr("param")?;
            let frontend: String = param.get_item("frontend")?.extract()?;
            let right: (f64, f64, f64) = param.get_item("domain_right_edge")?.extract()?;
            assert_eq!(frontend, "gamer");
            assert_eq!(right, (1.0, 0.0, 0.0));
            Ok(())
        })
        .unwrap();
}

#[test]
fn registered_row_and_field_view_visible_from_python() {
    let mut reg = registry("amrlink_alias");
    reg.set_parameters(params_1d(2)).unwrap();
    let mut grid = left_half();
    reg.add_grid(&grid.record()).unwrap();

    let address = grid.buffer_mut(0).as_mut_ptr() as usize;
    grid.buffer_mut(0)[3] = -42.0;

    reg.runtime()
        .with_module(|module| -> PyResult<()> {
            let right: f64 = module
                .getattr("hierarchy")?
                .get_item("grid_right_edge")?
                .get_item((0, 0))?
                .extract()?;
            assert_eq!(right, 0.5);

            let fields = module.getattr("grid_data")?.get_item(0)?;
            for label in grid.labels() {
                let view = fields.get_item(label.as_str())?;
                let shape: (usize, usize, usize) = view.getattr("shape")?.extract()?;
                let data: usize = view.getattr("ctypes")?.getattr("data")?.extract()?;
                assert_eq!(shape, (8, 1, 1));
                assert_eq!(data, address);
            }
            let value: f64 = fields.get_item("density")?.get_item((3, 0, 0))?.extract()?;
            assert_eq!(value, -42.0);
            Ok(())
        })
        .unwrap();
}

#[test]
fn dropping_the_runtime_unpublishes_the_module() {
    let reg = registry("amrlink_dropped");
    let published = |name: &str| {
        Python::attach(|py| -> PyResult<bool> {
            py.import("sys")?.getattr("modules")?.contains(name)
        })
        .unwrap()
    };
    assert!(published("amrlink_dropped"));
    drop(reg);
    assert!(!published("amrlink_dropped"));
}
