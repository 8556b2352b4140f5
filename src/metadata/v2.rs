//! Zarr V2 metadata.
//!
//! Array metadata is split between a `.zarray` document and an optional `.zattrs` document holding user attributes.

/// Zarr V2 array metadata.
pub mod array;

pub use array::{ArrayMetadataV2, ArrayMetadataV2Order, FillValueMetadataV2};

pub mod codec;

mod metadata;
pub use metadata::MetadataV2;
