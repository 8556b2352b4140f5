//! Zarr V2 `numcodecs` codec configurations that differ from their Zarr V3 counterparts.
//!
//! Codecs not listed here share their configuration between Zarr V2 and V3.

/// `blosc` codec metadata.
pub mod blosc;
/// `zfpy` codec metadata.
pub mod zfpy;
