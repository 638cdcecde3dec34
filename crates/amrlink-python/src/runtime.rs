//! [`Runtime`] over an embedded CPython interpreter.

use amrlink_core::{
    ArrayHandle, ContainerHandle, DType, Element, FieldType, FieldView, HandleTable, Key,
    ParamValue, Runtime, RuntimeError,
};
use numpy::ndarray::ArrayView3;
use numpy::{PyArray2, PyArray3, PyArrayMethods, PyUntypedArrayMethods};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyTuple};
use pyo3::IntoPyObjectExt;
use tracing::debug;

use crate::error::{backend, borrowed, check_index};

/// Base object of a numpy array that borrows simulation memory.
///
/// Holds only the address and size so that `arr.base` identifies the
/// buffer from the Python side; the memory itself belongs to the
/// simulation.
#[pyclass(frozen, module = "amrlink")]
struct BorrowedBuffer {
    #[pyo3(get)]
    address: usize,
    #[pyo3(get)]
    nbytes: usize,
}

/// A numpy array behind an [`ArrayHandle`].
enum ArrayEntry {
    F32(Py<PyArray2<f32>>),
    F64(Py<PyArray2<f64>>),
    I64(Py<PyArray2<i64>>),
    View { dtype: DType, array: Py<PyAny> },
}

impl ArrayEntry {
    fn dtype(&self) -> DType {
        match self {
            Self::F32(_) => DType::F32,
            Self::F64(_) => DType::F64,
            Self::I64(_) => DType::I64,
            Self::View { dtype, .. } => *dtype,
        }
    }

    fn object<'py>(&self, py: Python<'py>) -> Bound<'py, PyAny> {
        match self {
            Self::F32(a) => a.bind(py).clone().into_any(),
            Self::F64(a) => a.bind(py).clone().into_any(),
            Self::I64(a) => a.bind(py).clone().into_any(),
            Self::View { array, .. } => array.bind(py).clone(),
        }
    }
}

/// Containers as `dict`s on a module published in `sys.modules`.
///
/// Top-level containers become attributes of the module, so analysis code
/// reads `import libyt; libyt.grid_data[3]["density"]`. Hierarchy arrays
/// are owned numpy arrays; field buffers are numpy arrays whose base is a
/// [`BorrowedBuffer`] and whose data pointer is the simulation's own.
pub struct PyRuntime {
    name: String,
    module: Py<PyModule>,
    containers: HandleTable<Py<PyDict>>,
    arrays: HandleTable<ArrayEntry>,
}

impl PyRuntime {
    /// Create module `name` and publish it in `sys.modules`, replacing any
    /// module already published under that name.
    pub fn new(name: &str) -> Result<Self, RuntimeError> {
        let module = Python::attach(|py| {
            let module = PyModule::new(py, name)?;
            py.import("sys")?
                .getattr("modules")?
                .set_item(name, &module)?;
            Ok::<_, PyErr>(module.unbind())
        })
        .map_err(backend)?;
        debug!(module = name, "published runtime module");
        Ok(Self {
            name: name.to_string(),
            module,
            containers: HandleTable::new(),
            arrays: HandleTable::new(),
        })
    }

    /// Name the module is published under.
    pub fn module_name(&self) -> &str {
        &self.name
    }

    /// Run `f` with the GIL held and the published module bound.
    pub fn with_module<T>(&self, f: impl FnOnce(&Bound<'_, PyModule>) -> T) -> T {
        Python::attach(|py| f(self.module.bind(py)))
    }

    fn dict<'py>(
        &self,
        py: Python<'py>,
        handle: ContainerHandle,
    ) -> Result<Bound<'py, PyDict>, RuntimeError> {
        self.containers
            .get(handle.0)
            .map(|d| d.bind(py).clone())
            .ok_or(RuntimeError::StaleHandle { handle: handle.0 })
    }

    fn entry(&self, handle: ArrayHandle) -> Result<&ArrayEntry, RuntimeError> {
        self.arrays
            .get(handle.0)
            .ok_or(RuntimeError::StaleHandle { handle: handle.0 })
    }
}

impl Drop for PyRuntime {
    fn drop(&mut self) {
        Python::attach(|py| {
            self.containers = HandleTable::new();
            self.arrays = HandleTable::new();
            let removed = py
                .import("sys")
                .and_then(|sys| sys.getattr("modules"))
                .and_then(|modules| modules.del_item(&self.name));
            if let Err(e) = removed {
                debug!(module = %self.name, "unpublishing runtime module failed: {e}");
            }
        });
    }
}

fn key_object<'py>(py: Python<'py>, key: Key<'_>) -> PyResult<Bound<'py, PyAny>> {
    match key {
        Key::Str(s) => s.into_bound_py_any(py),
        Key::Int(i) => i.into_bound_py_any(py),
    }
}

fn param_object<'py>(py: Python<'py>, value: &ParamValue) -> PyResult<Bound<'py, PyAny>> {
    match value {
        ParamValue::Float(v) => v.into_bound_py_any(py),
        ParamValue::Int(v) => v.into_bound_py_any(py),
        ParamValue::Text(s) => s.as_str().into_bound_py_any(py),
        ParamValue::FloatVec3(v) => Ok(PyTuple::new(py, *v)?.into_any()),
        ParamValue::IntVec3(v) => Ok(PyTuple::new(py, *v)?.into_any()),
    }
}

/// A numpy array over `view`'s memory, with a [`BorrowedBuffer`] as base.
fn borrow_view<'py, T: numpy::Element>(
    py: Python<'py>,
    view: &FieldView,
) -> PyResult<Bound<'py, PyAny>> {
    let base = Bound::new(
        py,
        BorrowedBuffer {
            address: view.as_ptr() as usize,
            nbytes: view.byte_len(),
        },
    )?;
    // SAFETY: `FieldView` is only built from a non-null `FieldPtr` whose
    // creator promised `len()` aligned elements of this type, valid for as
    // long as the runtime may read them.
    let data = unsafe { ArrayView3::from_shape_ptr(view.shape(), view.as_ptr().cast::<T>()) };
    let array = unsafe { PyArray3::<T>::borrow_from_array(&data, base.into_any()) };
    Ok(array.into_any())
}

fn write_into<T: numpy::Element>(
    array: &Bound<'_, PyArray2<T>>,
    row: usize,
    col: usize,
    value: T,
) -> Result<(), RuntimeError> {
    let shape = [array.shape()[0], array.shape()[1]];
    check_index(row, col, shape)?;
    let mut rw = array.try_readwrite().map_err(borrowed)?;
    if let Some(slot) = rw.get_mut([row, col]) {
        *slot = value;
    }
    Ok(())
}

impl Runtime for PyRuntime {
    fn create_container(&mut self, name: &str) -> Result<ContainerHandle, RuntimeError> {
        let dict = Python::attach(|py| {
            let dict = PyDict::new(py);
            self.module.bind(py).setattr(name, &dict)?;
            Ok::<_, PyErr>(dict.unbind())
        })
        .map_err(backend)?;
        Ok(ContainerHandle(self.containers.insert(dict)))
    }

    fn ensure_nested(
        &mut self,
        parent: ContainerHandle,
        key: Key<'_>,
    ) -> Result<ContainerHandle, RuntimeError> {
        let nested = Python::attach(|py| {
            let parent = self.dict(py, parent)?;
            let py_key = key_object(py, key).map_err(backend)?;
            match parent.get_item(&py_key).map_err(backend)? {
                Some(existing) => existing
                    .cast_into::<PyDict>()
                    .map(Bound::unbind)
                    .map_err(|_| RuntimeError::WrongEntry {
                        key: key.to_string(),
                    }),
                None => {
                    let dict = PyDict::new(py);
                    parent.set_item(&py_key, &dict).map_err(backend)?;
                    Ok(dict.unbind())
                }
            }
        })?;
        Ok(ContainerHandle(self.containers.insert(nested)))
    }

    fn release_container(&mut self, handle: ContainerHandle) {
        Python::attach(|_| drop(self.containers.remove(handle.0)));
    }

    fn release_array(&mut self, handle: ArrayHandle) {
        Python::attach(|_| drop(self.arrays.remove(handle.0)));
    }

    fn container_len(&self, container: ContainerHandle) -> Result<usize, RuntimeError> {
        Python::attach(|py| Ok(self.dict(py, container)?.len()))
    }

    fn clear_container(&mut self, container: ContainerHandle) -> Result<(), RuntimeError> {
        Python::attach(|py| {
            self.dict(py, container)?.clear();
            Ok(())
        })
    }

    fn create_numeric_array(
        &mut self,
        shape: [usize; 2],
        dtype: DType,
    ) -> Result<ArrayHandle, RuntimeError> {
        let entry = Python::attach(|py| match dtype {
            DType::F32 => ArrayEntry::F32(PyArray2::<f32>::zeros(py, shape, false).unbind()),
            DType::F64 => ArrayEntry::F64(PyArray2::<f64>::zeros(py, shape, false).unbind()),
            DType::I64 => ArrayEntry::I64(PyArray2::<i64>::zeros(py, shape, false).unbind()),
        });
        Ok(ArrayHandle(self.arrays.insert(entry)))
    }

    fn wrap_external_buffer(&mut self, view: &FieldView) -> Result<ArrayHandle, RuntimeError> {
        let array = Python::attach(|py| {
            let array = match view.ftype() {
                FieldType::Float => borrow_view::<f32>(py, view),
                FieldType::Double => borrow_view::<f64>(py, view),
            };
            array.map(Bound::unbind)
        })
        .map_err(backend)?;
        Ok(ArrayHandle(self.arrays.insert(ArrayEntry::View {
            dtype: view.ftype().dtype(),
            array,
        })))
    }

    fn write_element(
        &mut self,
        array: ArrayHandle,
        row: usize,
        col: usize,
        value: Element,
    ) -> Result<(), RuntimeError> {
        let entry = self.entry(array)?;
        Python::attach(|py| match (entry, value) {
            (ArrayEntry::F64(a), Element::Float(v)) => write_into(a.bind(py), row, col, v),
            (ArrayEntry::F32(a), Element::Float(v)) => write_into(a.bind(py), row, col, v as f32),
            (ArrayEntry::I64(a), Element::Int(v)) => write_into(a.bind(py), row, col, v),
            (ArrayEntry::View { .. }, _) => Err(RuntimeError::Backend {
                reason: "cannot write through a borrowed field view".to_string(),
            }),
            (entry, value) => Err(RuntimeError::TypeMismatch {
                expected: entry.dtype(),
                actual: value.dtype(),
            }),
        })
    }

    fn set_array(
        &mut self,
        container: ContainerHandle,
        key: Key<'_>,
        array: ArrayHandle,
    ) -> Result<(), RuntimeError> {
        let entry = self.entry(array)?;
        Python::attach(|py| {
            let dict = self.dict(py, container)?;
            let py_key = key_object(py, key).map_err(backend)?;
            dict.set_item(py_key, entry.object(py)).map_err(backend)
        })
    }

    fn set_param(
        &mut self,
        container: ContainerHandle,
        key: &str,
        value: &ParamValue,
    ) -> Result<(), RuntimeError> {
        Python::attach(|py| {
            let dict = self.dict(py, container)?;
            let value = param_object(py, value).map_err(backend)?;
            dict.set_item(key, value).map_err(backend)
        })
    }
}
