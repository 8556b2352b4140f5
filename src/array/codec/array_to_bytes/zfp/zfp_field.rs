use std::ptr::NonNull;

use zfp_sys::{
    zfp_field, zfp_field_1d, zfp_field_2d, zfp_field_3d, zfp_field_4d, zfp_field_alloc,
    zfp_field_free, zfp_field_set_pointer, zfp_field_size, zfp_field_type, zfp_type,
};

use super::zfp_type_size;

/// A `zfp` field.
///
/// The field borrows the element buffer it describes.
#[derive(Debug)]
pub(super) struct ZfpField<'a> {
    field: NonNull<zfp_field>,
    _data: std::marker::PhantomData<&'a mut [u8]>,
}

impl Drop for ZfpField<'_> {
    fn drop(&mut self) {
        // SAFETY: the field was allocated by zfp and is freed once
        unsafe {
            zfp_field_free(self.field.as_ptr());
        }
    }
}

impl<'a> ZfpField<'a> {
    /// Create a field over `data` with a C order `shape` of up to 4 dimensions.
    ///
    /// Returns [`None`] if the length of `data` does not match the shape and type.
    pub(super) fn new(data: &'a mut [u8], zfp_type: zfp_type, shape: &[usize]) -> Option<Self> {
        let num_elements = shape.iter().product::<usize>();
        if zfp_type_size(zfp_type)?.checked_mul(num_elements)? != data.len() {
            return None;
        }
        let pointer = data.as_mut_ptr().cast::<std::ffi::c_void>();
        // SAFETY: `data` holds exactly the elements described by the field
        let field = unsafe {
            match *shape {
                [nx] => zfp_field_1d(pointer, zfp_type, nx),
                [ny, nx] => zfp_field_2d(pointer, zfp_type, nx, ny),
                [nz, ny, nx] => zfp_field_3d(pointer, zfp_type, nx, ny, nz),
                [nw, nz, ny, nx] => zfp_field_4d(pointer, zfp_type, nx, ny, nz, nw),
                _ => return None,
            }
        };
        Self::from_ptr(field)
    }

    /// Allocate an empty field, to be populated from a `zfp` header.
    pub(super) fn alloc() -> Option<Self> {
        // SAFETY: allocation has no preconditions
        Self::from_ptr(unsafe { zfp_field_alloc() })
    }

    fn from_ptr(field: *mut zfp_field) -> Option<Self> {
        NonNull::new(field).map(|field| Self {
            field,
            _data: std::marker::PhantomData,
        })
    }

    /// The number of elements described by the field.
    pub(super) fn num_elements(&self) -> usize {
        // SAFETY: the field is valid, a null size pointer is permitted
        unsafe { zfp_field_size(self.field.as_ptr(), std::ptr::null_mut()) }
    }

    pub(super) fn zfp_type(&self) -> zfp_type {
        // SAFETY: the field is valid
        unsafe { zfp_field_type(self.field.as_ptr()) }
    }

    /// Point the field at `data`.
    ///
    /// Returns [`None`] if `data` does not match the size and type read into the field.
    pub(super) fn set_data(&mut self, data: &'a mut [u8]) -> Option<()> {
        let size = zfp_type_size(self.zfp_type())?.checked_mul(self.num_elements())?;
        if size != data.len() {
            return None;
        }
        // SAFETY: `data` holds exactly the elements described by the field
        unsafe {
            zfp_field_set_pointer(
                self.field.as_ptr(),
                data.as_mut_ptr().cast::<std::ffi::c_void>(),
            );
        }
        Some(())
    }

    pub(super) const fn as_zfp_field(&self) -> *mut zfp_field {
        self.field.as_ptr()
    }
}
