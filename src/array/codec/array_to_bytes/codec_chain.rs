//! An array to bytes codec formed by joining an array to array sequence, an array to bytes codec, and a bytes to bytes sequence of codecs.

use crate::{
    array::{
        codec::{
            ArrayToArrayCodecTraits, ArrayToBytesCodecTraits, BytesToBytesCodecTraits, Codec,
            CodecError, CodecTraits,
        },
        ArrayBytes, BytesRepresentation, ChunkRepresentation, RawBytes,
    },
    metadata::v3::MetadataV3,
    plugin::PluginCreateError,
};

/// A codec chain is a sequence of array to array codecs, one array to bytes codec, and a sequence of bytes to bytes codecs.
///
/// Encoding applies the codecs in declared order, and decoding applies them in reverse.
/// The output of a decode is validated against the decoded chunk representation, so a codec chain never silently truncates or pads a chunk.
#[derive(Debug, Clone)]
pub struct CodecChain {
    array_to_array: Vec<Box<dyn ArrayToArrayCodecTraits>>,
    array_to_bytes: Box<dyn ArrayToBytesCodecTraits>,
    bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>>,
}

impl CodecChain {
    /// Create a new codec chain.
    #[must_use]
    pub fn new(
        array_to_array: Vec<Box<dyn ArrayToArrayCodecTraits>>,
        array_to_bytes: Box<dyn ArrayToBytesCodecTraits>,
        bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>>,
    ) -> Self {
        Self {
            array_to_array,
            array_to_bytes,
            bytes_to_bytes,
        }
    }

    /// Create a new codec chain from a list of codec metadata.
    ///
    /// # Errors
    /// Returns a [`PluginCreateError`] if:
    ///  - a codec could not be created,
    ///  - no array to bytes codec is supplied,
    ///  - more than one array to bytes codec is supplied, or
    ///  - an array to array codec follows the array to bytes codec, or a bytes to bytes codec precedes it.
    pub fn from_metadata(metadatas: &[MetadataV3]) -> Result<Self, PluginCreateError> {
        let mut array_to_array: Vec<Box<dyn ArrayToArrayCodecTraits>> = vec![];
        let mut array_to_bytes: Option<Box<dyn ArrayToBytesCodecTraits>> = None;
        let mut bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>> = vec![];
        for metadata in metadatas {
            match Codec::from_metadata(metadata)? {
                Codec::ArrayToArray(codec) => {
                    if array_to_bytes.is_some() {
                        return Err(PluginCreateError::Other(format!(
                            "array to array codec {} follows the array to bytes codec",
                            metadata.name()
                        )));
                    }
                    array_to_array.push(codec);
                }
                Codec::ArrayToBytes(codec) => {
                    if array_to_bytes.is_some() {
                        return Err("multiple array to bytes codecs".into());
                    }
                    array_to_bytes = Some(codec);
                }
                Codec::BytesToBytes(codec) => {
                    if array_to_bytes.is_none() {
                        return Err(PluginCreateError::Other(format!(
                            "bytes to bytes codec {} precedes the array to bytes codec",
                            metadata.name()
                        )));
                    }
                    bytes_to_bytes.push(codec);
                }
            }
        }

        array_to_bytes
            .map(|array_to_bytes| Self::new(array_to_array, array_to_bytes, bytes_to_bytes))
            .ok_or_else(|| "missing array to bytes codec".into())
    }

    /// Create codec chain metadata.
    #[must_use]
    pub fn create_metadatas(&self) -> Vec<MetadataV3> {
        let mut metadatas =
            Vec::with_capacity(self.array_to_array.len() + 1 + self.bytes_to_bytes.len());
        for codec in &self.array_to_array {
            metadatas.extend(codec.create_metadata());
        }
        metadatas.extend(self.array_to_bytes.create_metadata());
        for codec in &self.bytes_to_bytes {
            metadatas.extend(codec.create_metadata());
        }
        metadatas
    }

    /// Get the array to array codecs.
    #[must_use]
    pub fn array_to_array_codecs(&self) -> &[Box<dyn ArrayToArrayCodecTraits>] {
        &self.array_to_array
    }

    /// Get the array to bytes codec.
    #[must_use]
    #[allow(clippy::borrowed_box)]
    pub fn array_to_bytes_codec(&self) -> &Box<dyn ArrayToBytesCodecTraits> {
        &self.array_to_bytes
    }

    /// Get the bytes to bytes codecs.
    #[must_use]
    pub fn bytes_to_bytes_codecs(&self) -> &[Box<dyn BytesToBytesCodecTraits>] {
        &self.bytes_to_bytes
    }

    /// The chunk representations at the input of each array to array codec, followed by the input of the array to bytes codec.
    fn array_representations(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<ChunkRepresentation>, CodecError> {
        let mut array_representations = Vec::with_capacity(self.array_to_array.len() + 1);
        array_representations.push(decoded_representation.clone());
        for codec in &self.array_to_array {
            let last = &array_representations[array_representations.len() - 1];
            let next = codec.compute_encoded_representation(last)?;
            array_representations.push(next);
        }
        Ok(array_representations)
    }

    /// The bytes representations at the output of the array to bytes codec, followed by the output of each bytes to bytes codec.
    fn bytes_representations(
        &self,
        array_representation_last: &ChunkRepresentation,
    ) -> Result<Vec<BytesRepresentation>, CodecError> {
        let mut bytes_representations = Vec::with_capacity(self.bytes_to_bytes.len() + 1);
        let mut bytes_representation = self
            .array_to_bytes
            .compute_encoded_size(array_representation_last)?;
        bytes_representations.push(bytes_representation);
        for codec in &self.bytes_to_bytes {
            bytes_representation = codec.compute_encoded_size(&bytes_representation);
            bytes_representations.push(bytes_representation);
        }
        Ok(bytes_representations)
    }
}

impl CodecTraits for CodecChain {
    fn create_metadata(&self) -> Option<MetadataV3> {
        // A codec chain is described by the metadata of its codecs, see create_metadatas().
        None
    }
}

impl ArrayToBytesCodecTraits for CodecChain {
    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        let array_representations = self.array_representations(decoded_representation)?;
        let bytes_representations =
            self.bytes_representations(&array_representations[array_representations.len() - 1])?;
        Ok(bytes_representations[bytes_representations.len() - 1])
    }

    fn encode<'a>(
        &self,
        bytes: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<RawBytes<'a>, CodecError> {
        bytes.validate(
            decoded_representation.num_elements(),
            decoded_representation.data_type().size(),
        )?;

        let mut decoded_representation = decoded_representation.clone();
        let mut bytes = bytes;
        for codec in &self.array_to_array {
            bytes = codec.encode(bytes, &decoded_representation)?;
            decoded_representation = codec.compute_encoded_representation(&decoded_representation)?;
        }

        let mut bytes = self.array_to_bytes.encode(bytes, &decoded_representation)?;

        for codec in &self.bytes_to_bytes {
            bytes = codec.encode(bytes)?;
        }
        Ok(bytes)
    }

    fn decode<'a>(
        &self,
        bytes: RawBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        let array_representations = self.array_representations(decoded_representation)?;
        let array_representation_last = &array_representations[array_representations.len() - 1];
        let bytes_representations = self.bytes_representations(array_representation_last)?;

        let mut bytes = bytes;
        for (codec, bytes_representation) in std::iter::zip(
            self.bytes_to_bytes.iter().rev(),
            bytes_representations.iter().rev().skip(1),
        ) {
            bytes = codec.decode(bytes, bytes_representation)?;
            if let BytesRepresentation::FixedSize(size) = bytes_representation {
                if bytes.len() as u64 != *size {
                    return Err(CodecError::UnexpectedChunkDecodedSize(bytes.len(), *size));
                }
            }
        }

        let mut bytes = self
            .array_to_bytes
            .decode(bytes, array_representation_last)?;
        bytes.validate(
            array_representation_last.num_elements(),
            array_representation_last.data_type().size(),
        )?;

        for (codec, array_representation) in std::iter::zip(
            self.array_to_array.iter().rev(),
            array_representations.iter().rev().skip(1),
        ) {
            bytes = codec.decode(bytes, array_representation)?;
        }

        bytes.validate(
            decoded_representation.num_elements(),
            decoded_representation.data_type().size(),
        )?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use crate::array::{codec::BytesCodec, DataType, FillValue};

    use super::*;

    const JSON_BYTES: &str = r#"{"name": "bytes", "configuration": {"endian": "big"}}"#;
    const JSON_SHUFFLE: &str = r#"{"name": "shuffle", "configuration": {"elementsize": 2}}"#;

    fn metadatas(jsons: &[&str]) -> Vec<MetadataV3> {
        jsons
            .iter()
            .map(|json| serde_json::from_str(json).unwrap())
            .collect()
    }

    fn representation() -> ChunkRepresentation {
        ChunkRepresentation::new(
            &vec![2, 2].try_into().unwrap(),
            DataType::UInt16,
            FillValue::from(0u16),
        )
    }

    #[test]
    fn codec_chain_round_trip() {
        let chain = CodecChain::from_metadata(&metadatas(&[JSON_BYTES, JSON_SHUFFLE])).unwrap();
        let elements: Vec<u16> = vec![1, 2, 3, 0x0400];
        let bytes = ArrayBytes::new_flen(bytemuck::cast_slice::<u16, u8>(&elements).to_vec());
        let encoded = chain.encode(bytes.clone(), &representation()).unwrap();
        // big endian, then the high bytes grouped before the low bytes
        assert_eq!(encoded.to_vec(), vec![0u8, 0, 0, 4, 1, 2, 3, 0]);
        let decoded = chain.decode(encoded, &representation()).unwrap();
        assert_eq!(decoded, bytes);
        assert_eq!(
            chain.compute_encoded_size(&representation()).unwrap(),
            BytesRepresentation::FixedSize(8)
        );
    }

    #[cfg(feature = "transpose")]
    #[test]
    fn codec_chain_array_to_array() {
        let chain = CodecChain::from_metadata(&metadatas(&[
            r#"{"name": "transpose", "configuration": {"order": [1, 0]}}"#,
            JSON_BYTES,
        ]))
        .unwrap();
        let elements: Vec<u16> = vec![1, 2, 3, 4];
        let bytes = ArrayBytes::new_flen(bytemuck::cast_slice::<u16, u8>(&elements).to_vec());
        let encoded = chain.encode(bytes.clone(), &representation()).unwrap();
        assert_eq!(encoded.to_vec(), vec![0u8, 1, 0, 3, 0, 2, 0, 4]);
        assert_eq!(chain.decode(encoded, &representation()).unwrap(), bytes);
        assert_eq!(chain.create_metadatas().len(), 2);
    }

    #[test]
    fn codec_chain_invalid_order() {
        assert!(CodecChain::from_metadata(&metadatas(&[JSON_SHUFFLE, JSON_BYTES])).is_err());
        assert!(CodecChain::from_metadata(&metadatas(&[JSON_BYTES, JSON_BYTES])).is_err());
        assert!(CodecChain::from_metadata(&metadatas(&[JSON_SHUFFLE])).is_err());
        assert!(CodecChain::from_metadata(&[]).is_err());
    }

    #[test]
    fn codec_chain_decoded_size_mismatch() {
        let chain = CodecChain::new(vec![], Box::new(BytesCodec::little()), vec![]);
        assert!(matches!(
            chain.decode(vec![0u8; 6].into(), &representation()),
            Err(CodecError::UnexpectedChunkDecodedSize(6, 8))
        ));
    }

    #[test]
    fn codec_chain_metadatas() {
        let chain = CodecChain::from_metadata(&metadatas(&[JSON_BYTES, JSON_SHUFFLE])).unwrap();
        assert_eq!(chain.create_metadatas(), metadatas(&[JSON_BYTES, JSON_SHUFFLE]));
    }
}
