use std::io::Read;

use crate::{
    array::{
        codec::{BytesToBytesCodecTraits, CodecError, CodecTraits},
        BytesRepresentation, RawBytes,
    },
    metadata::v3::MetadataV3,
};

use super::{Bz2CodecConfiguration, Bz2CodecConfigurationV1, Bz2CompressionLevel, IDENTIFIER};

/// A `bz2` codec implementation.
#[derive(Clone, Debug)]
pub struct Bz2Codec {
    level: Bz2CompressionLevel,
}

impl Bz2Codec {
    /// Create a new `bz2` codec.
    #[must_use]
    pub const fn new(level: Bz2CompressionLevel) -> Self {
        Self { level }
    }

    /// Create a new `bz2` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &Bz2CodecConfiguration) -> Self {
        let Bz2CodecConfiguration::V1(configuration) = configuration;
        Self::new(configuration.level)
    }
}

impl CodecTraits for Bz2Codec {
    fn create_metadata(&self) -> Option<MetadataV3> {
        let configuration = Bz2CodecConfigurationV1 { level: self.level };
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &configuration).ok()
    }
}

impl BytesToBytesCodecTraits for Bz2Codec {
    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        decoded_representation
            .size()
            .map_or(BytesRepresentation::UnboundedSize, |size| {
                // A 4 byte header, an 11 byte footer and at most 1.25x expansion of the blocks
                BytesRepresentation::BoundedSize(4 + 11 + size + (size + 3) / 4)
            })
    }

    fn encode<'a>(&self, decoded_value: RawBytes<'a>) -> Result<RawBytes<'a>, CodecError> {
        let mut encoder = bzip2::read::BzEncoder::new(
            decoded_value.as_ref(),
            bzip2::Compression::new(self.level.as_u32()),
        );
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out.into())
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_representation: &BytesRepresentation,
    ) -> Result<RawBytes<'a>, CodecError> {
        let mut decoder = bzip2::read::BzDecoder::new(encoded_value.as_ref());
        let capacity = decoded_representation
            .size()
            .and_then(|size| usize::try_from(size).ok())
            .unwrap_or_default();
        let mut out: Vec<u8> = Vec::with_capacity(capacity);
        decoder.read_to_end(&mut out)?;
        Ok(out.into())
    }
}
