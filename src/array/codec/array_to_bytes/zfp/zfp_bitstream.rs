use std::ptr::NonNull;

use zfp_sys::{bitstream, stream_close, stream_open};

/// A `zfp` bitstream over a word aligned buffer.
pub(super) struct ZfpBitstream<'a> {
    stream: NonNull<bitstream>,
    _buffer: std::marker::PhantomData<&'a mut [u64]>,
}

impl Drop for ZfpBitstream<'_> {
    fn drop(&mut self) {
        // SAFETY: the stream was opened by `stream_open` and is closed once
        unsafe {
            stream_close(self.stream.as_ptr());
        }
    }
}

impl<'a> ZfpBitstream<'a> {
    pub(super) fn new(buffer: &'a mut [u64]) -> Option<Self> {
        // SAFETY: the buffer outlives the bitstream
        let stream = unsafe {
            stream_open(
                buffer.as_mut_ptr().cast::<std::ffi::c_void>(),
                std::mem::size_of_val(buffer),
            )
        };
        NonNull::new(stream).map(|stream| Self {
            stream,
            _buffer: std::marker::PhantomData,
        })
    }

    pub(super) const fn as_bitstream(&self) -> *mut bitstream {
        self.stream.as_ptr()
    }
}
