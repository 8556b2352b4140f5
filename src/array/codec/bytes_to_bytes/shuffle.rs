//! The `shuffle` bytes to bytes codec.
//!
//! Groups the bytes of fixed size elements by their position within each element, which is the byte shuffle filter of `numcodecs`.
//! For `n` elements of `elementsize` bytes, byte `j` of element `i` is moved to position `j * n + i`.
//! Trailing bytes that do not fill an element are copied unchanged.
//!
//! The codec is also matched by the name `numcodecs.shuffle`.
//!
//! ### Example `JSON` metadata
//! ```json
//! {
//!     "name": "shuffle",
//!     "configuration": {
//!         "elementsize": 4
//!     }
//! }
//! ```

use std::num::NonZeroUsize;

pub use crate::metadata::v3::codec::shuffle::{
    ShuffleCodecConfiguration, ShuffleCodecConfigurationV1, IDENTIFIER, IDENTIFIER_NUMCODECS,
};

use crate::{
    array::{
        codec::{BytesToBytesCodecTraits, Codec, CodecError, CodecPlugin, CodecTraits},
        BytesRepresentation, RawBytes,
    },
    metadata::v3::MetadataV3,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_shuffle, create_codec_shuffle)
}

fn is_name_shuffle(name: &str) -> bool {
    name.eq(IDENTIFIER) || name.eq(IDENTIFIER_NUMCODECS)
}

pub(crate) fn create_codec_shuffle(metadata: &MetadataV3) -> Result<Codec, PluginCreateError> {
    let configuration: ShuffleCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(ShuffleCodec::new_with_configuration(&configuration));
    Ok(Codec::BytesToBytes(codec))
}

/// A `shuffle` codec implementation.
#[derive(Clone, Debug)]
pub struct ShuffleCodec {
    elementsize: NonZeroUsize,
}

impl ShuffleCodec {
    /// Create a new `shuffle` codec for elements of `elementsize` bytes.
    #[must_use]
    pub const fn new(elementsize: NonZeroUsize) -> Self {
        Self { elementsize }
    }

    /// Create a new `shuffle` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &ShuffleCodecConfiguration) -> Self {
        let ShuffleCodecConfiguration::V1(configuration) = configuration;
        Self::new(configuration.elementsize)
    }

    /// Shuffle or unshuffle the whole elements of `input`.
    fn transform(&self, input: &[u8], unshuffle: bool) -> Vec<u8> {
        let elementsize = self.elementsize.get();
        let count = input.len() / elementsize;
        let mut output = input.to_vec();
        if elementsize > 1 {
            for i in 0..count {
                for j in 0..elementsize {
                    let element_major = i * elementsize + j;
                    let byte_major = j * count + i;
                    if unshuffle {
                        output[element_major] = input[byte_major];
                    } else {
                        output[byte_major] = input[element_major];
                    }
                }
            }
        }
        output
    }
}

impl CodecTraits for ShuffleCodec {
    fn create_metadata(&self) -> Option<MetadataV3> {
        let configuration = ShuffleCodecConfigurationV1::new(self.elementsize);
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &configuration).ok()
    }
}

impl BytesToBytesCodecTraits for ShuffleCodec {
    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        *decoded_representation
    }

    fn encode<'a>(&self, decoded_value: RawBytes<'a>) -> Result<RawBytes<'a>, CodecError> {
        Ok(self.transform(&decoded_value, false).into())
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        _decoded_representation: &BytesRepresentation,
    ) -> Result<RawBytes<'a>, CodecError> {
        Ok(self.transform(&encoded_value, true).into())
    }
}
