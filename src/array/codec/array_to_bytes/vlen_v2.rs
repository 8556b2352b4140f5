//! The `vlen_v2` array to bytes codec.
//!
//! Encodes variable length strings in the interleaved layout of the `numcodecs` `VLenUTF8` and `VLenBytes` codecs:
//!  - a `u32` little endian element count, then
//!  - for each element, a `u32` little endian byte length followed by the element bytes.
//!
//! The codec is also matched by the legacy names `vlen-utf8` and `vlen-bytes`.
//!
//! ### Example `JSON` metadata
//! ```json
//! {
//!     "name": "vlen_v2"
//! }
//! ```

use std::mem::size_of;

pub use crate::metadata::v3::codec::vlen_v2::{
    VlenV2CodecConfiguration, VlenV2CodecConfigurationV1, IDENTIFIER, IDENTIFIER_VLEN_UTF8,
};

use crate::{
    array::{
        codec::{
            ArrayToBytesCodecTraits, Codec, CodecError, CodecPlugin, CodecTraits,
        },
        ArrayBytes, BytesRepresentation, ChunkRepresentation, DataTypeSize, RawBytes,
    },
    metadata::v3::MetadataV3,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_vlen_v2, create_codec_vlen_v2)
}

fn is_name_vlen_v2(name: &str) -> bool {
    name.eq(IDENTIFIER) || name.eq(IDENTIFIER_VLEN_UTF8) || name.eq("vlen-bytes")
}

pub(crate) fn create_codec_vlen_v2(metadata: &MetadataV3) -> Result<Codec, PluginCreateError> {
    let configuration: VlenV2CodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(VlenV2Codec::new_with_configuration(&configuration));
    Ok(Codec::ArrayToBytes(codec))
}

/// A `vlen_v2` codec implementation.
#[derive(Debug, Clone, Default)]
pub struct VlenV2Codec {}

impl VlenV2Codec {
    /// Create a new `vlen_v2` codec.
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Create a new `vlen_v2` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(_configuration: &VlenV2CodecConfiguration) -> Self {
        Self::new()
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, CodecError> {
    bytes
        .get(offset..offset + size_of::<u32>())
        .and_then(|bytes| <[u8; 4]>::try_from(bytes).ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| CodecError::from("vlen_v2 encoded bytes are truncated"))
}

fn check_variable(decoded_representation: &ChunkRepresentation) -> Result<(), CodecError> {
    match decoded_representation.data_type().size() {
        DataTypeSize::Variable => Ok(()),
        DataTypeSize::Fixed(_) => Err(CodecError::UnsupportedDataType(
            decoded_representation.data_type().clone(),
            IDENTIFIER.to_string(),
        )),
    }
}

impl CodecTraits for VlenV2Codec {
    fn create_metadata(&self) -> Option<MetadataV3> {
        Some(MetadataV3::new(IDENTIFIER))
    }
}

impl ArrayToBytesCodecTraits for VlenV2Codec {
    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        check_variable(decoded_representation)?;
        Ok(BytesRepresentation::UnboundedSize)
    }

    fn encode<'a>(
        &self,
        bytes: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<RawBytes<'a>, CodecError> {
        check_variable(decoded_representation)?;
        bytes.validate(decoded_representation.num_elements(), DataTypeSize::Variable)?;
        let (bytes, offsets) = bytes.into_variable()?;

        let num_elements = offsets.len() - 1;
        let num_elements_u32 = u32::try_from(num_elements)
            .map_err(|_| CodecError::from("vlen_v2 supports at most u32::MAX elements"))?;
        let mut encoded =
            Vec::with_capacity(size_of::<u32>() * (1 + num_elements) + bytes.len());
        encoded.extend_from_slice(&num_elements_u32.to_le_bytes());
        for (&start, &end) in std::iter::zip(offsets.iter(), offsets.iter().skip(1)) {
            let length = u32::try_from(end - start)
                .map_err(|_| CodecError::from("vlen_v2 element exceeds u32::MAX bytes"))?;
            encoded.extend_from_slice(&length.to_le_bytes());
            encoded.extend_from_slice(&bytes[start..end]);
        }
        Ok(encoded.into())
    }

    fn decode<'a>(
        &self,
        bytes: RawBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        check_variable(decoded_representation)?;
        let num_elements = decoded_representation.num_elements();
        let header_num_elements = read_u32(&bytes, 0)?;
        if u64::from(header_num_elements) != num_elements {
            return Err(CodecError::Other(format!(
                "vlen_v2 header has {header_num_elements} elements, expected {num_elements}"
            )));
        }

        let mut bytes_out = Vec::with_capacity(bytes.len());
        let mut offsets_out = Vec::with_capacity(header_num_elements as usize + 1);
        let mut offset = size_of::<u32>();
        for _ in 0..header_num_elements {
            let length = read_u32(&bytes, offset)? as usize;
            offset += size_of::<u32>();
            let element = bytes
                .get(offset..offset + length)
                .ok_or_else(|| CodecError::from("vlen_v2 encoded bytes are truncated"))?;
            offsets_out.push(bytes_out.len());
            bytes_out.extend_from_slice(element);
            offset += length;
        }
        offsets_out.push(bytes_out.len());
        if offset != bytes.len() {
            return Err(CodecError::Other(format!(
                "vlen_v2 encoded bytes have {} trailing bytes",
                bytes.len() - offset
            )));
        }
        Ok(ArrayBytes::new_vlen(bytes_out, offsets_out))
    }
}
