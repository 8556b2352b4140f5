//! The `bytes` array to bytes codec.
//!
//! Encodes arrays of fixed size data types as little endian or big endian in lexicographical order.
//! The `endian` configuration may be omitted only if every element is a single byte.
//! Each code point of a `fixed_length_utf32` string is swapped as a 4 byte unit.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/bytes/v1.0.html>.
//!
//! ### Example `JSON` metadata
//! ```json
//! {
//!     "name": "bytes",
//!     "configuration": {
//!         "endian": "little"
//!     }
//! }
//! ```

mod bytes_codec;

pub use crate::metadata::v3::codec::bytes::{
    BytesCodecConfiguration, BytesCodecConfigurationV1, Endianness, IDENTIFIER,
};
pub use bytes_codec::BytesCodec;

use crate::{
    array::{
        codec::{Codec, CodecPlugin},
        DataType,
    },
    metadata::v3::MetadataV3,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_bytes, create_codec_bytes)
}

fn is_name_bytes(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

pub(crate) fn create_codec_bytes(metadata: &MetadataV3) -> Result<Codec, PluginCreateError> {
    let configuration: BytesCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(BytesCodec::new_with_configuration(&configuration));
    Ok(Codec::ArrayToBytes(codec))
}

/// The size of the unit whose bytes are swapped when changing the endianness of `data_type`.
///
/// Returns [`None`] for a variable size data type.
fn swap_unit_size(data_type: &DataType) -> Option<usize> {
    match data_type {
        DataType::Bool | DataType::Int8 | DataType::UInt8 => Some(1),
        DataType::Int16 | DataType::UInt16 | DataType::Float16 => Some(2),
        DataType::Int32 | DataType::UInt32 | DataType::Float32 | DataType::FixedLengthUtf32(_) => {
            Some(4)
        }
        DataType::Int64
        | DataType::UInt64
        | DataType::Float64
        | DataType::NumpyDateTime64 { .. }
        | DataType::NumpyTimeDelta64 { .. } => Some(8),
        DataType::String => None,
    }
}

fn reverse_endianness(bytes: &mut [u8], unit_size: usize) {
    if unit_size > 1 {
        bytes
            .chunks_exact_mut(unit_size)
            .for_each(<[u8]>::reverse);
    }
}
