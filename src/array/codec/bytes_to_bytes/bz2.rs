//! The `bz2` bytes to bytes codec.
//!
//! Applies [bzip2](https://sourceware.org/bzip2/) compression with [`bzip2`].
//!
//! This codec requires the `bz2` feature, which is disabled by default.
//!
//! The codec is also matched by the name `numcodecs.bz2`, and the `numcodecs` `bz2` compressor of Zarr V2 arrays maps to it.
//!
//! ### Example `JSON` metadata
//! ```json
//! {
//!     "name": "bz2",
//!     "configuration": {
//!         "level": 9
//!     }
//! }
//! ```

mod bz2_codec;

pub use crate::metadata::v3::codec::bz2::{
    Bz2CodecConfiguration, Bz2CodecConfigurationV1, Bz2CompressionLevel, Bz2CompressionLevelError,
    IDENTIFIER, IDENTIFIER_NUMCODECS,
};
pub use bz2_codec::Bz2Codec;

use crate::{
    array::codec::{Codec, CodecPlugin},
    metadata::v3::MetadataV3,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_bz2, create_codec_bz2)
}

fn is_name_bz2(name: &str) -> bool {
    name.eq(IDENTIFIER) || name.eq(IDENTIFIER_NUMCODECS)
}

pub(crate) fn create_codec_bz2(metadata: &MetadataV3) -> Result<Codec, PluginCreateError> {
    let configuration: Bz2CodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(Bz2Codec::new_with_configuration(&configuration));
    Ok(Codec::BytesToBytes(codec))
}
