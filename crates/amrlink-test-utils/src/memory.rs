//! An in-memory [`Runtime`] that records everything it is asked to do.

use amrlink_core::{
    ArrayHandle, ContainerHandle, DType, Element, FieldType, FieldView, HandleTable, Key,
    ParamValue, Runtime, RuntimeError,
};
use indexmap::IndexMap;

/// Owned form of a [`Key`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OwnedKey {
    Str(String),
    Int(i64),
}

impl From<Key<'_>> for OwnedKey {
    fn from(key: Key<'_>) -> Self {
        match key {
            Key::Str(s) => Self::Str(s.to_string()),
            Key::Int(i) => Self::Int(i),
        }
    }
}

/// One container entry. Containers and arrays are referenced by arena index.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    Container(usize),
    Array(usize),
    Param(ParamValue),
}

/// Storage behind one array.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayData {
    /// Allocated by the runtime. Unwritten elements read as NaN or
    /// `i64::MIN`.
    Owned {
        shape: [usize; 2],
        dtype: DType,
        values: Vec<Element>,
    },
    /// A view over caller memory; nothing was copied.
    Borrowed(FieldView),
}

impl ArrayData {
    /// Element at `[row, col]` of an owned array.
    pub fn get(&self, row: usize, col: usize) -> Option<Element> {
        match self {
            Self::Owned { shape, values, .. } if row < shape[0] && col < shape[1] => {
                values.get(row * shape[1] + col).copied()
            }
            _ => None,
        }
    }

    /// Shape of an owned array.
    pub fn shape(&self) -> Option<[usize; 2]> {
        match self {
            Self::Owned { shape, .. } => Some(*shape),
            Self::Borrowed(_) => None,
        }
    }

    /// Dtype of the array.
    pub fn dtype(&self) -> DType {
        match self {
            Self::Owned { dtype, .. } => *dtype,
            Self::Borrowed(view) => view.ftype().dtype(),
        }
    }
}

/// In-process [`Runtime`] for tests.
///
/// Containers and arrays live in arenas for the lifetime of the runtime;
/// handles index into them through [`HandleTable`]s so that released
/// handles are detected as stale.
#[derive(Default)]
pub struct MemoryRuntime {
    roots: IndexMap<String, usize>,
    containers: Vec<IndexMap<OwnedKey, Entry>>,
    arrays: Vec<ArrayData>,
    container_handles: HandleTable<usize>,
    array_handles: HandleTable<usize>,
    array_creations: usize,
    fail_array_at: Option<usize>,
    fail_wrap: bool,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`-th (0-based) call to `create_numeric_array` fail.
    pub fn fail_array_creation_at(&mut self, n: usize) {
        self.fail_array_at = Some(n);
    }

    /// Make every `wrap_external_buffer` call fail while `fail` is set.
    pub fn fail_wrapping(&mut self, fail: bool) {
        self.fail_wrap = fail;
    }

    /// Number of `create_numeric_array` calls so far, failed ones included.
    pub fn array_creations(&self) -> usize {
        self.array_creations
    }

    /// Number of live (unreleased) container and array handles.
    pub fn live_handles(&self) -> (usize, usize) {
        (self.container_handles.len(), self.array_handles.len())
    }

    pub fn has_root(&self, name: &str) -> bool {
        self.roots.contains_key(name)
    }

    /// Number of entries in a top-level container.
    pub fn root_len(&self, name: &str) -> Option<usize> {
        self.roots.get(name).map(|&idx| self.containers[idx].len())
    }

    /// Follow `path` from the top-level container `root`.
    pub fn lookup(&self, root: &str, path: &[Key<'_>]) -> Option<&Entry> {
        let mut container = *self.roots.get(root)?;
        let (last, parents) = path.split_last()?;
        for key in parents {
            match self.containers[container].get(&OwnedKey::from(*key))? {
                Entry::Container(idx) => container = *idx,
                _ => return None,
            }
        }
        self.containers[container].get(&OwnedKey::from(*last))
    }

    /// A value published into the `param` container.
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        match self.lookup("param", &[Key::Str(name)])? {
            Entry::Param(value) => Some(value),
            _ => None,
        }
    }

    /// A hierarchy array by key.
    pub fn hierarchy_array(&self, key: &str) -> Option<&ArrayData> {
        match self.lookup("hierarchy", &[Key::Str(key)])? {
            Entry::Array(idx) => self.arrays.get(*idx),
            _ => None,
        }
    }

    /// Element `[row, col]` of a hierarchy array.
    pub fn hierarchy_value(&self, key: &str, row: usize, col: usize) -> Option<Element> {
        self.hierarchy_array(key)?.get(row, col)
    }

    /// Grid ids present in `grid_data`, in insertion order.
    pub fn grid_data_ids(&self) -> Vec<i64> {
        let Some(&root) = self.roots.get("grid_data") else {
            return Vec::new();
        };
        self.containers[root]
            .keys()
            .filter_map(|k| match k {
                OwnedKey::Int(i) => Some(*i),
                OwnedKey::Str(_) => None,
            })
            .collect()
    }

    /// Field labels stored for one grid, in insertion order.
    pub fn grid_labels(&self, id: i64) -> Vec<String> {
        match self.lookup("grid_data", &[Key::Int(id)]) {
            Some(Entry::Container(idx)) => self.containers[*idx]
                .keys()
                .filter_map(|k| match k {
                    OwnedKey::Str(s) => Some(s.clone()),
                    OwnedKey::Int(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The view exposed as `grid_data[id][label]`.
    pub fn grid_field(&self, id: i64, label: &str) -> Option<FieldView> {
        match self.lookup("grid_data", &[Key::Int(id), Key::Str(label)])? {
            Entry::Array(idx) => match self.arrays.get(*idx)? {
                ArrayData::Borrowed(view) => Some(*view),
                ArrayData::Owned { .. } => None,
            },
            _ => None,
        }
    }

    /// Read element `index` of a double-precision field through its view.
    ///
    /// The caller's buffer must still be alive, which every fixture in this
    /// crate guarantees for as long as the owning grid is.
    #[allow(unsafe_code)]
    pub fn read_f64(&self, id: i64, label: &str, index: usize) -> Option<f64> {
        let view = self.grid_field(id, label)?;
        if view.ftype() != FieldType::Double || index >= view.len() {
            return None;
        }
        // SAFETY: bounds checked above; the fixture owning the buffer
        // outlives the runtime in every test.
        Some(unsafe { *view.as_ptr().cast::<f64>().add(index) })
    }

    fn container(&self, handle: ContainerHandle) -> Result<usize, RuntimeError> {
        self.container_handles
            .get(handle.0)
            .copied()
            .ok_or(RuntimeError::StaleHandle { handle: handle.0 })
    }

    fn array(&self, handle: ArrayHandle) -> Result<usize, RuntimeError> {
        self.array_handles
            .get(handle.0)
            .copied()
            .ok_or(RuntimeError::StaleHandle { handle: handle.0 })
    }

    fn push_array(&mut self, data: ArrayData) -> ArrayHandle {
        self.arrays.push(data);
        ArrayHandle(self.array_handles.insert(self.arrays.len() - 1))
    }
}

impl Runtime for MemoryRuntime {
    fn create_container(&mut self, name: &str) -> Result<ContainerHandle, RuntimeError> {
        self.containers.push(IndexMap::new());
        let idx = self.containers.len() - 1;
        self.roots.insert(name.to_string(), idx);
        Ok(ContainerHandle(self.container_handles.insert(idx)))
    }

    fn ensure_nested(
        &mut self,
        parent: ContainerHandle,
        key: Key<'_>,
    ) -> Result<ContainerHandle, RuntimeError> {
        let parent = self.container(parent)?;
        let owned = OwnedKey::from(key);
        let idx = match self.containers[parent].get(&owned) {
            Some(Entry::Container(idx)) => *idx,
            Some(_) => {
                return Err(RuntimeError::WrongEntry {
                    key: key.to_string(),
                })
            }
            None => {
                self.containers.push(IndexMap::new());
                let idx = self.containers.len() - 1;
                self.containers[parent].insert(owned, Entry::Container(idx));
                idx
            }
        };
        Ok(ContainerHandle(self.container_handles.insert(idx)))
    }

    fn release_container(&mut self, handle: ContainerHandle) {
        self.container_handles.remove(handle.0);
    }

    fn release_array(&mut self, handle: ArrayHandle) {
        self.array_handles.remove(handle.0);
    }

    fn container_len(&self, container: ContainerHandle) -> Result<usize, RuntimeError> {
        Ok(self.containers[self.container(container)?].len())
    }

    fn clear_container(&mut self, container: ContainerHandle) -> Result<(), RuntimeError> {
        let idx = self.container(container)?;
        self.containers[idx].clear();
        Ok(())
    }

    fn create_numeric_array(
        &mut self,
        shape: [usize; 2],
        dtype: DType,
    ) -> Result<ArrayHandle, RuntimeError> {
        let call = self.array_creations;
        self.array_creations += 1;
        if self.fail_array_at == Some(call) {
            return Err(RuntimeError::Backend {
                reason: format!("injected failure on array creation #{call}"),
            });
        }
        let fill = match dtype {
            DType::F32 | DType::F64 => Element::Float(f64::NAN),
            DType::I64 => Element::Int(i64::MIN),
        };
        Ok(self.push_array(ArrayData::Owned {
            shape,
            dtype,
            values: vec![fill; shape[0] * shape[1]],
        }))
    }

    fn wrap_external_buffer(&mut self, view: &FieldView) -> Result<ArrayHandle, RuntimeError> {
        if self.fail_wrap {
            return Err(RuntimeError::Backend {
                reason: "injected failure on buffer wrap".to_string(),
            });
        }
        Ok(self.push_array(ArrayData::Borrowed(*view)))
    }

    fn write_element(
        &mut self,
        array: ArrayHandle,
        row: usize,
        col: usize,
        value: Element,
    ) -> Result<(), RuntimeError> {
        let idx = self.array(array)?;
        match &mut self.arrays[idx] {
            ArrayData::Owned {
                shape,
                dtype,
                values,
            } => {
                let compatible = matches!(
                    (*dtype, value),
                    (DType::F32 | DType::F64, Element::Float(_)) | (DType::I64, Element::Int(_))
                );
                if !compatible {
                    return Err(RuntimeError::TypeMismatch {
                        expected: *dtype,
                        actual: value.dtype(),
                    });
                }
                if row >= shape[0] || col >= shape[1] {
                    return Err(RuntimeError::OutOfBounds {
                        row,
                        col,
                        shape: *shape,
                    });
                }
                values[row * shape[1] + col] = value;
                Ok(())
            }
            ArrayData::Borrowed(_) => Err(RuntimeError::Backend {
                reason: "cannot write through a borrowed view".to_string(),
            }),
        }
    }

    fn set_array(
        &mut self,
        container: ContainerHandle,
        key: Key<'_>,
        array: ArrayHandle,
    ) -> Result<(), RuntimeError> {
        let container = self.container(container)?;
        let array = self.array(array)?;
        self.containers[container].insert(key.into(), Entry::Array(array));
        Ok(())
    }

    fn set_param(
        &mut self,
        container: ContainerHandle,
        key: &str,
        value: &ParamValue,
    ) -> Result<(), RuntimeError> {
        let container = self.container(container)?;
        self.containers[container]
            .insert(OwnedKey::Str(key.to_string()), Entry::Param(value.clone()));
        Ok(())
    }
}
