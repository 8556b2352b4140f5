//! The `fletcher32` bytes to bytes codec.
//!
//! Appends a little endian [HDF5 Fletcher-32](https://github.com/Unidata/netcdf-c/blob/main/plugins/H5checksum.c) checksum of the input bytestream.
//! The checksum is verified on decode if [`Config::validate_checksums`](crate::config::Config::validate_checksums) is enabled.
//!
//! This codec requires the `fletcher32` feature, which is disabled by default.
//!
//! The codec is also matched by the name `numcodecs.fletcher32`, and the `numcodecs` `fletcher32` filter and compressor of Zarr V2 arrays map to it.
//!
//! ### Example `JSON` metadata
//! ```json
//! {
//!     "name": "fletcher32"
//! }
//! ```

mod fletcher32_codec;

pub use crate::metadata::v3::codec::fletcher32::{
    Fletcher32CodecConfiguration, Fletcher32CodecConfigurationV1, IDENTIFIER,
    IDENTIFIER_NUMCODECS,
};
pub use fletcher32_codec::Fletcher32Codec;

use crate::{
    array::codec::{Codec, CodecPlugin},
    metadata::v3::MetadataV3,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_fletcher32, create_codec_fletcher32)
}

fn is_name_fletcher32(name: &str) -> bool {
    name.eq(IDENTIFIER) || name.eq(IDENTIFIER_NUMCODECS)
}

pub(crate) fn create_codec_fletcher32(metadata: &MetadataV3) -> Result<Codec, PluginCreateError> {
    let configuration: Fletcher32CodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(Fletcher32Codec::new_with_configuration(&configuration));
    Ok(Codec::BytesToBytes(codec))
}

const CHECKSUM_SIZE: usize = core::mem::size_of::<u32>();
