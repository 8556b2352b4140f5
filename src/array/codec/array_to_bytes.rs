//! Array to bytes codecs.

pub mod bytes;
pub mod codec_chain;
#[cfg(feature = "pcodec")]
pub mod pcodec;
pub mod vlen_v2;
#[cfg(feature = "zfp")]
pub mod zfp;
#[cfg(feature = "zfp")]
pub mod zfpy;
