//! The `numcodecs.zfpy` array to bytes codec.
//!
//! Compatible with the `numcodecs` `zfpy` codec: the [`zfp`](super::zfp) encoding preceded by a full zfp header.
//! Zarr V2 arrays with a `zfpy` compressor are converted to the `zfp` codec with `write_header` enabled instead.
//!
//! This codec requires the `zfp` feature, which is disabled by default.
//!
//! ### Example `JSON` metadata
//! ```json
//! {
//!     "name": "numcodecs.zfpy",
//!     "configuration": {
//!         "mode": 4,
//!         "tolerance": 0.01
//!     }
//! }
//! ```

pub use crate::metadata::v2::codec::zfpy::{
    ZfpyCodecConfigurationMode, ZfpyCodecConfigurationNumcodecs,
};

use crate::{
    array::{
        codec::{ArrayToBytesCodecTraits, Codec, CodecError, CodecPlugin, CodecTraits},
        ArrayBytes, BytesRepresentation, ChunkRepresentation, RawBytes,
    },
    metadata::{v2::codec::zfpy::codec_zfpy_v2_numcodecs_to_v3, v3::MetadataV3},
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

use super::zfp::ZfpCodec;

/// The identifier for the `numcodecs.zfpy` codec.
pub const IDENTIFIER: &str = "numcodecs.zfpy";

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_zfpy, create_codec_zfpy)
}

fn is_name_zfpy(name: &str) -> bool {
    name.eq(IDENTIFIER) || name.eq(crate::metadata::v2::codec::zfpy::IDENTIFIER)
}

pub(crate) fn create_codec_zfpy(metadata: &MetadataV3) -> Result<Codec, PluginCreateError> {
    let configuration: ZfpyCodecConfigurationNumcodecs = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(
        ZfpyCodec::new_with_configuration(&configuration)
            .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?,
    );
    Ok(Codec::ArrayToBytes(codec))
}

/// A `numcodecs.zfpy` codec implementation.
#[derive(Clone, Debug)]
pub struct ZfpyCodec {
    configuration: ZfpyCodecConfigurationNumcodecs,
    zfp: ZfpCodec,
}

impl ZfpyCodec {
    /// Create a new `numcodecs.zfpy` codec from configuration.
    ///
    /// # Errors
    /// Returns an error if the parameter of the configured mode is missing or invalid.
    pub fn new_with_configuration(
        configuration: &ZfpyCodecConfigurationNumcodecs,
    ) -> Result<Self, CodecError> {
        let zfp = codec_zfpy_v2_numcodecs_to_v3(configuration)
            .map_err(|err| CodecError::Other(err.to_string()))?;
        Ok(Self {
            configuration: configuration.clone(),
            zfp: ZfpCodec::new_with_configuration(&zfp),
        })
    }
}

impl CodecTraits for ZfpyCodec {
    fn create_metadata(&self) -> Option<MetadataV3> {
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &self.configuration).ok()
    }
}

impl ArrayToBytesCodecTraits for ZfpyCodec {
    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        self.zfp.compute_encoded_size(decoded_representation)
    }

    fn encode<'a>(
        &self,
        bytes: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<RawBytes<'a>, CodecError> {
        self.zfp.encode(bytes, decoded_representation)
    }

    fn decode<'a>(
        &self,
        bytes: RawBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        self.zfp.decode(bytes, decoded_representation)
    }
}

#[cfg(test)]
mod tests {
    use crate::array::DataType;

    use super::*;

    #[test]
    fn codec_zfpy_metadata() {
        let metadata: MetadataV3 = serde_json::from_str(
            r#"{"name": "numcodecs.zfpy", "configuration": {"mode": 4, "tolerance": 0.01}}"#,
        )
        .unwrap();
        let Codec::ArrayToBytes(codec) = create_codec_zfpy(&metadata).unwrap() else {
            panic!()
        };
        assert_eq!(codec.create_metadata(), Some(metadata));

        let metadata: MetadataV3 =
            serde_json::from_str(r#"{"name": "zfpy", "configuration": {"mode": 2}}"#).unwrap();
        assert!(create_codec_zfpy(&metadata).is_err());
    }

    #[test]
    fn codec_zfpy_round_trip() {
        let codec = ZfpyCodec::new_with_configuration(
            &serde_json::from_str(r#"{"mode": 4, "tolerance": 0.01}"#).unwrap(),
        )
        .unwrap();
        let representation = ChunkRepresentation::new(
            &vec![5, 5].try_into().unwrap(),
            DataType::Float32,
            0.0f32.into(),
        );
        let elements: Vec<f32> = (0..25).map(|i| i as f32).collect();
        let bytes = ArrayBytes::new_flen(bytemuck::cast_slice::<f32, u8>(&elements).to_vec());
        let encoded = codec.encode(bytes, &representation).unwrap();
        // "zfp" magic of the full header
        assert_eq!(&encoded[..3], b"zfp");
        let decoded = codec.decode(encoded, &representation).unwrap();
        let decoded = bytemuck::pod_collect_to_vec::<u8, f32>(&decoded.into_fixed().unwrap());
        for (x, y) in std::iter::zip(&elements, &decoded) {
            assert!((x - y).abs() <= 0.01);
        }
    }
}
