use std::ptr::NonNull;

use zfp_sys::{
    zfp_stream, zfp_stream_close, zfp_stream_open, zfp_stream_rewind, zfp_stream_set_accuracy,
    zfp_stream_set_bit_stream, zfp_stream_set_params, zfp_stream_set_precision,
    zfp_stream_set_rate, zfp_stream_set_reversible, zfp_type, zfp_type_zfp_type_double,
    zfp_type_zfp_type_float,
};

use super::{zfp_bitstream::ZfpBitstream, ZfpMode};

/// A `zfp` stream.
pub(super) struct ZfpStream(NonNull<zfp_stream>);

impl Drop for ZfpStream {
    fn drop(&mut self) {
        // SAFETY: the stream was opened by `zfp_stream_open` and is closed once
        unsafe {
            zfp_stream_close(self.0.as_ptr());
        }
    }
}

impl ZfpStream {
    /// Open a stream with default compression parameters.
    pub(super) fn open() -> Option<Self> {
        // SAFETY: a null bitstream is permitted, it is set before use
        NonNull::new(unsafe { zfp_stream_open(std::ptr::null_mut()) }).map(Self)
    }

    /// Open a stream in `mode` for a `dims` dimensional field of `zfp_type`.
    ///
    /// Returns [`None`] for fixed accuracy mode with integer data, or invalid expert parameters.
    pub(super) fn new(mode: &ZfpMode, zfp_type: zfp_type, dims: usize) -> Option<Self> {
        let stream = Self::open()?;
        let zfp = stream.as_zfp_stream();
        // SAFETY: the stream is valid
        unsafe {
            match *mode {
                ZfpMode::Expert {
                    minbits,
                    maxbits,
                    maxprec,
                    minexp,
                } => {
                    if zfp_stream_set_params(zfp, minbits, maxbits, maxprec, minexp) == 0 {
                        return None;
                    }
                }
                ZfpMode::FixedRate { rate } => {
                    zfp_stream_set_rate(zfp, rate, zfp_type, u32::try_from(dims).ok()?, 0);
                }
                ZfpMode::FixedPrecision { precision } => {
                    zfp_stream_set_precision(zfp, precision);
                }
                ZfpMode::FixedAccuracy { tolerance } => {
                    if zfp_type != zfp_type_zfp_type_float && zfp_type != zfp_type_zfp_type_double
                    {
                        return None;
                    }
                    zfp_stream_set_accuracy(zfp, tolerance);
                }
                ZfpMode::Reversible => zfp_stream_set_reversible(zfp),
            }
        }
        Some(stream)
    }

    /// Attach `bitstream` and rewind to its start.
    pub(super) fn set_bitstream(&self, bitstream: &ZfpBitstream) {
        // SAFETY: the stream and bitstream are valid, the bitstream outlives its use by the stream
        unsafe {
            zfp_stream_set_bit_stream(self.as_zfp_stream(), bitstream.as_bitstream());
            zfp_stream_rewind(self.as_zfp_stream());
        }
    }

    pub(super) const fn as_zfp_stream(&self) -> *mut zfp_stream {
        self.0.as_ptr()
    }
}
