use zfp_sys::{
    zfp_compress, zfp_decompress, zfp_read_header, zfp_stream_maximum_size, zfp_write_header,
    ZFP_HEADER_FULL,
};

use crate::{
    array::{
        codec::{ArrayToBytesCodecTraits, CodecError, CodecTraits},
        ArrayBytes, BytesRepresentation, ChunkRepresentation, RawBytes,
    },
    metadata::v3::MetadataV3,
};

use super::{
    data_type_to_zfp_type, zfp_bitstream::ZfpBitstream, zfp_field::ZfpField,
    zfp_stream::ZfpStream, ZfpCodecConfiguration, ZfpCodecConfigurationV1, ZfpMode, IDENTIFIER,
};

/// A `zfp` codec implementation.
#[derive(Clone, Copy, Debug)]
pub struct ZfpCodec {
    mode: ZfpMode,
    write_header: bool,
}

/// A word aligned copy of `bytes`, zero padded to a whole number of words.
fn to_words(bytes: &[u8]) -> Vec<u64> {
    let mut words = vec![0u64; bytes.len().div_ceil(8)];
    bytemuck::cast_slice_mut::<u64, u8>(&mut words)[..bytes.len()].copy_from_slice(bytes);
    words
}

fn shape_usize(decoded_representation: &ChunkRepresentation) -> Result<Vec<usize>, CodecError> {
    decoded_representation
        .shape()
        .iter()
        .map(|size| usize::try_from(size.get()))
        .collect::<Result<_, _>>()
        .map_err(|_| CodecError::from("the chunk shape exceeds usize::MAX"))
}

impl ZfpCodec {
    /// Create a new `zfp` codec.
    ///
    /// If `write_header` is true, a full zfp header precedes the compressed stream.
    #[must_use]
    pub const fn new(mode: ZfpMode, write_header: bool) -> Self {
        Self { mode, write_header }
    }

    /// Create a new `zfp` codec from configuration.
    #[must_use]
    pub fn new_with_configuration(configuration: &ZfpCodecConfiguration) -> Self {
        let ZfpCodecConfiguration::V1(configuration) = configuration;
        Self::new(
            configuration.mode,
            configuration.write_header.unwrap_or(false),
        )
    }

    /// The codec configuration.
    #[must_use]
    pub fn configuration(&self) -> ZfpCodecConfiguration {
        ZfpCodecConfiguration::V1(ZfpCodecConfigurationV1 {
            write_header: self.write_header.then_some(true),
            mode: self.mode,
        })
    }
}

impl CodecTraits for ZfpCodec {
    fn create_metadata(&self) -> Option<MetadataV3> {
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &self.configuration()).ok()
    }
}

impl ArrayToBytesCodecTraits for ZfpCodec {
    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        data_type_to_zfp_type(decoded_representation.data_type())?;
        Ok(BytesRepresentation::UnboundedSize)
    }

    fn encode<'a>(
        &self,
        bytes: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<RawBytes<'a>, CodecError> {
        let data_type = decoded_representation.data_type();
        let zfp_type = data_type_to_zfp_type(data_type)?;
        bytes.validate(decoded_representation.num_elements(), data_type.size())?;
        let bytes = bytes.into_fixed()?;
        let shape = shape_usize(decoded_representation)?;

        let mut decoded_words = to_words(&bytes);
        let decoded = &mut bytemuck::cast_slice_mut::<u64, u8>(&mut decoded_words)[..bytes.len()];
        let field = ZfpField::new(decoded, zfp_type, &shape)
            .ok_or_else(|| CodecError::from("failed to create zfp field"))?;
        let stream = ZfpStream::new(&self.mode, zfp_type, shape.len())
            .ok_or_else(|| CodecError::from("failed to create zfp stream"))?;

        // SAFETY: the stream and field are valid
        let bufsize =
            unsafe { zfp_stream_maximum_size(stream.as_zfp_stream(), field.as_zfp_field()) };
        let mut encoded_words = vec![0u64; bufsize.div_ceil(8)];
        let bitstream = ZfpBitstream::new(&mut encoded_words)
            .ok_or_else(|| CodecError::from("failed to create zfp bitstream"))?;
        stream.set_bitstream(&bitstream);

        if self.write_header {
            // SAFETY: the stream and field are valid
            let bits = unsafe {
                zfp_write_header(stream.as_zfp_stream(), field.as_zfp_field(), ZFP_HEADER_FULL)
            };
            if bits == 0 {
                return Err(CodecError::from("failed to write zfp header"));
            }
        }

        // SAFETY: the stream and field are valid
        let size = unsafe { zfp_compress(stream.as_zfp_stream(), field.as_zfp_field()) };
        drop(bitstream);
        if size == 0 {
            return Err(CodecError::from("zfp compression failed"));
        }
        let mut encoded = bytemuck::cast_slice::<u64, u8>(&encoded_words).to_vec();
        encoded.truncate(size);
        Ok(encoded.into())
    }

    fn decode<'a>(
        &self,
        bytes: RawBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        let data_type = decoded_representation.data_type();
        let zfp_type = data_type_to_zfp_type(data_type)?;
        let shape = shape_usize(decoded_representation)?;
        let size = decoded_representation
            .fixed_size()
            .and_then(|size| usize::try_from(size).ok())
            .ok_or_else(|| CodecError::from("the chunk size exceeds usize::MAX"))?;

        let mut encoded_words = to_words(&bytes);
        let mut decoded_words = vec![0u64; size.div_ceil(8)];
        let decoded = &mut bytemuck::cast_slice_mut::<u64, u8>(&mut decoded_words)[..size];
        let bitstream = ZfpBitstream::new(&mut encoded_words)
            .ok_or_else(|| CodecError::from("failed to create zfp bitstream"))?;

        let ret = if self.write_header {
            let stream =
                ZfpStream::open().ok_or_else(|| CodecError::from("failed to create zfp stream"))?;
            stream.set_bitstream(&bitstream);
            let mut field =
                ZfpField::alloc().ok_or_else(|| CodecError::from("failed to create zfp field"))?;
            // SAFETY: the stream and field are valid
            let bits = unsafe {
                zfp_read_header(stream.as_zfp_stream(), field.as_zfp_field(), ZFP_HEADER_FULL)
            };
            if bits == 0 {
                return Err(CodecError::from("failed to read zfp header"));
            }
            if field.zfp_type() != zfp_type
                || field.num_elements() as u64 != decoded_representation.num_elements()
            {
                return Err(CodecError::from(
                    "the zfp header does not match the chunk data type or shape",
                ));
            }
            field
                .set_data(decoded)
                .ok_or_else(|| CodecError::from("failed to create zfp field"))?;
            // SAFETY: the stream and field are valid, the field points to a buffer of its size
            unsafe { zfp_decompress(stream.as_zfp_stream(), field.as_zfp_field()) }
        } else {
            let field = ZfpField::new(decoded, zfp_type, &shape)
                .ok_or_else(|| CodecError::from("failed to create zfp field"))?;
            let stream = ZfpStream::new(&self.mode, zfp_type, shape.len())
                .ok_or_else(|| CodecError::from("failed to create zfp stream"))?;
            stream.set_bitstream(&bitstream);
            // SAFETY: the stream and field are valid, the field points to a buffer of its size
            unsafe { zfp_decompress(stream.as_zfp_stream(), field.as_zfp_field()) }
        };
        drop(bitstream);
        if ret == 0 {
            return Err(CodecError::from("zfp decompression failed"));
        }

        let mut decoded = bytemuck::cast_slice::<u64, u8>(&decoded_words).to_vec();
        decoded.truncate(size);
        Ok(ArrayBytes::new_flen(decoded))
    }
}
