//! Element types and the borrowed field-buffer view.
//!
//! A simulation hands its field buffers over as [`FieldPtr`]s. The
//! registrar pairs each pointer with the grid's dimensions and element type
//! to form a [`FieldView`], which a [`Runtime`](crate::Runtime) wraps
//! without copying. Nothing in amrlink ever frees or extends the lifetime of
//! the memory behind a view.

use std::ffi::c_void;
use std::fmt;

/// Floating-point type of a grid's field buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// 32-bit IEEE float.
    Float,
    /// 64-bit IEEE float.
    Double,
}

impl FieldType {
    /// Size in bytes of one element.
    pub fn size_of(self) -> usize {
        match self {
            Self::Float => std::mem::size_of::<f32>(),
            Self::Double => std::mem::size_of::<f64>(),
        }
    }

    /// The runtime array dtype a view of this field type is created with.
    pub fn dtype(self) -> DType {
        match self {
            Self::Float => DType::F32,
            Self::Double => DType::F64,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
        }
    }
}

/// Element type of a runtime-side numeric array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// 64-bit signed integer.
    I64,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F32 => write!(f, "float32"),
            Self::F64 => write!(f, "float64"),
            Self::I64 => write!(f, "int64"),
        }
    }
}

/// A single value written into an owned runtime array.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Element {
    /// Written into an `F64` (or `F32`, narrowed) array.
    Float(f64),
    /// Written into an `I64` array.
    Int(i64),
}

impl Element {
    /// The dtype this element naturally belongs to.
    pub fn dtype(self) -> DType {
        match self {
            Self::Float(_) => DType::F64,
            Self::Int(_) => DType::I64,
        }
    }
}

/// Caller-owned field buffer.
///
/// A `FieldPtr` is a plain address; it neither owns nor borrows in the
/// Rust sense. See [`FieldPtr::new`] for the contract the caller accepts
/// when creating one.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldPtr(*mut c_void);

impl FieldPtr {
    /// Wrap a raw pointer to a simulation field buffer.
    ///
    /// # Safety
    ///
    /// When the grid carrying this pointer is registered, `ptr` must point
    /// to a contiguous C-ordered buffer of at least
    /// `dimensions[0] * dimensions[1] * dimensions[2]` elements of the
    /// grid's `field_ftype`, suitably aligned. The buffer must stay valid
    /// and must not be freed or reused for as long as the embedded runtime
    /// may read the exposed view, conventionally until the current analysis
    /// pass completes.
    #[allow(unsafe_code)]
    pub unsafe fn new(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    /// A null pointer. Grids carrying one fail validation.
    pub fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    /// Whether the pointer is null.
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }

    /// The raw address.
    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }
}

impl fmt::Debug for FieldPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldPtr({:p})", self.0)
    }
}

/// Borrowed, shape-annotated view of one caller-owned field buffer.
///
/// Produced by the registrar only after the owning grid has passed
/// validation, so `ptr` is non-null and every extent is positive. The
/// memory contract is the one accepted in [`FieldPtr::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldView {
    ptr: FieldPtr,
    shape: [usize; 3],
    ftype: FieldType,
}

impl FieldView {
    /// Pair a validated pointer with its shape and element type.
    ///
    /// Returns `None` for a null pointer or a zero extent.
    pub fn new(ptr: FieldPtr, shape: [usize; 3], ftype: FieldType) -> Option<Self> {
        if ptr.is_null() || shape.contains(&0) {
            return None;
        }
        Some(Self { ptr, shape, ftype })
    }

    /// Start of the caller's buffer.
    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr.as_ptr()
    }

    /// Extents along each axis, C order.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Element type of the buffer.
    pub fn ftype(&self) -> FieldType {
        self.ftype
    }

    /// Number of elements covered by the view.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Always `false`: views with a zero extent cannot be constructed.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of bytes covered by the view.
    pub fn byte_len(&self) -> usize {
        self.len() * self.ftype.size_of()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(unsafe_code)]
    fn view_rejects_null_and_zero_extent() {
        let mut buf = [0.0f64; 8];
        let ptr = unsafe { FieldPtr::new(buf.as_mut_ptr().cast()) };
        assert!(FieldView::new(FieldPtr::null(), [2, 2, 2], FieldType::Double).is_none());
        assert!(FieldView::new(ptr, [2, 0, 2], FieldType::Double).is_none());
        let view = FieldView::new(ptr, [2, 2, 2], FieldType::Double).unwrap();
        assert_eq!(view.len(), 8);
        assert_eq!(view.byte_len(), 64);
        assert_eq!(view.as_ptr(), buf.as_mut_ptr().cast());
    }

    #[test]
    fn field_type_maps_to_dtype() {
        assert_eq!(FieldType::Float.dtype(), DType::F32);
        assert_eq!(FieldType::Double.dtype(), DType::F64);
        assert_eq!(FieldType::Float.size_of(), 4);
    }
}
