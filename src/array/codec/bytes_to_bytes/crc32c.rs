//! The `crc32c` (CRC32C checksum) bytes to bytes codec.
//!
//! Appends a little endian CRC32C checksum of the input bytestream.
//! The checksum is verified on decode if [`Config::validate_checksums`](crate::config::Config::validate_checksums) is enabled.
//!
//! This codec requires the `crc32c` feature, which is enabled by default.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/crc32c/v1.0.html>.

mod crc32c_codec;

pub use crate::metadata::v3::codec::crc32c::{
    Crc32cCodecConfiguration, Crc32cCodecConfigurationV1, IDENTIFIER,
};
pub use crc32c_codec::Crc32cCodec;

use crate::{
    array::codec::{Codec, CodecPlugin},
    metadata::v3::MetadataV3,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_crc32c, create_codec_crc32c)
}

fn is_name_crc32c(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

pub(crate) fn create_codec_crc32c(metadata: &MetadataV3) -> Result<Codec, PluginCreateError> {
    let configuration: Crc32cCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(Crc32cCodec::new_with_configuration(&configuration));
    Ok(Codec::BytesToBytes(codec))
}

const CHECKSUM_SIZE: usize = core::mem::size_of::<u32>();
