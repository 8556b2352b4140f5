use std::ffi::c_char;

use blosc_sys::{blosc_get_complib_info, BLOSC_MAX_OVERHEAD};

use crate::{
    array::{
        codec::{BytesToBytesCodecTraits, CodecError, CodecTraits},
        BytesRepresentation, RawBytes,
    },
    metadata::v3::MetadataV3,
    plugin::PluginCreateError,
};

use super::{
    blosc_compress_bytes, blosc_decompress_bytes, compressor_cstr, BloscCodecConfiguration,
    BloscCodecConfigurationV1, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
    IDENTIFIER,
};

/// A `blosc` codec implementation.
#[derive(Clone, Debug)]
pub struct BloscCodec {
    configuration: BloscCodecConfigurationV1,
}

impl BloscCodec {
    /// Create a new `blosc` codec.
    ///
    /// The block size is chosen automatically if `blocksize` is none or 0.
    /// `typesize` must be a positive integer if shuffling is enabled.
    ///
    /// # Errors
    /// Returns [`PluginCreateError`] if
    ///  - the compressor is not supported, or
    ///  - `typesize` has not been specified and shuffling is enabled.
    pub fn new(
        cname: BloscCompressor,
        clevel: BloscCompressionLevel,
        blocksize: Option<usize>,
        shuffle: BloscShuffleMode,
        typesize: Option<usize>,
    ) -> Result<Self, PluginCreateError> {
        if shuffle != BloscShuffleMode::NoShuffle && typesize.unwrap_or_default() == 0 {
            return Err(PluginCreateError::Other(
                "blosc typesize must be a positive integer if the shuffle mode is not noshuffle"
                    .to_string(),
            ));
        }

        // SAFETY: the compressor name is nul terminated and the output pointers may be null.
        let support = unsafe {
            blosc_get_complib_info(
                compressor_cstr(cname),
                std::ptr::null_mut::<*mut c_char>(),
                std::ptr::null_mut::<*mut c_char>(),
            )
        };
        if support < 0 {
            return Err(PluginCreateError::Other(format!(
                "blosc compressor {cname:?} is not supported"
            )));
        }

        Ok(Self {
            configuration: BloscCodecConfigurationV1 {
                cname,
                clevel,
                shuffle,
                typesize,
                blocksize: blocksize.unwrap_or_default(),
            },
        })
    }

    /// Create a new `blosc` codec from configuration.
    ///
    /// # Errors
    /// Returns [`PluginCreateError`] if the configuration is not supported.
    pub fn new_with_configuration(
        configuration: &BloscCodecConfiguration,
    ) -> Result<Self, PluginCreateError> {
        let BloscCodecConfiguration::V1(configuration) = configuration;
        Self::new(
            configuration.cname,
            configuration.clevel,
            Some(configuration.blocksize),
            configuration.shuffle,
            configuration.typesize,
        )
    }
}

impl CodecTraits for BloscCodec {
    fn create_metadata(&self) -> Option<MetadataV3> {
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &self.configuration).ok()
    }
}

impl BytesToBytesCodecTraits for BloscCodec {
    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        decoded_representation
            .size()
            .map_or(BytesRepresentation::UnboundedSize, |size| {
                BytesRepresentation::BoundedSize(size + u64::from(BLOSC_MAX_OVERHEAD))
            })
    }

    fn encode<'a>(&self, decoded_value: RawBytes<'a>) -> Result<RawBytes<'a>, CodecError> {
        let encoded_value = blosc_compress_bytes(
            &decoded_value,
            self.configuration.clevel,
            self.configuration.shuffle,
            self.configuration.typesize.unwrap_or(1),
            self.configuration.cname,
            self.configuration.blocksize,
        )?;
        Ok(encoded_value.into())
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        _decoded_representation: &BytesRepresentation,
    ) -> Result<RawBytes<'a>, CodecError> {
        Ok(blosc_decompress_bytes(&encoded_value)?.into())
    }
}
