//! The `zstd` bytes to bytes codec.
//!
//! Applies [Zstandard](https://datatracker.ietf.org/doc/html/rfc8878) compression.
//! If `checksum` is set, the frame carries a content checksum which is verified by the decoder.
//!
//! This codec requires the `zstd` feature, which is enabled by default.
//!
//! ### Example `JSON` metadata
//! ```json
//! {
//!     "name": "zstd",
//!     "configuration": {
//!         "level": 1,
//!         "checksum": true
//!     }
//! }
//! ```

mod zstd_codec;

pub use crate::metadata::v3::codec::zstd::{
    ZstdCodecConfiguration, ZstdCodecConfigurationV1, ZstdCompressionLevel, IDENTIFIER,
};
pub use zstd_codec::ZstdCodec;

use crate::{
    array::codec::{Codec, CodecPlugin},
    metadata::v3::MetadataV3,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_zstd, create_codec_zstd)
}

fn is_name_zstd(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

pub(crate) fn create_codec_zstd(metadata: &MetadataV3) -> Result<Codec, PluginCreateError> {
    let configuration: ZstdCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(ZstdCodec::new_with_configuration(&configuration));
    Ok(Codec::BytesToBytes(codec))
}

#[cfg(test)]
mod tests {
    use crate::array::{
        codec::{BytesToBytesCodecTraits, CodecTraits},
        BytesRepresentation,
    };

    use super::*;

    const JSON_VALID: &str = r#"{"name": "zstd", "configuration": {"level": 22, "checksum": false}}"#;

    #[test]
    fn codec_zstd_configuration() {
        let metadata: MetadataV3 = serde_json::from_str(JSON_VALID).unwrap();
        let Codec::BytesToBytes(codec) = create_codec_zstd(&metadata).unwrap() else {
            panic!()
        };
        assert_eq!(codec.create_metadata(), Some(metadata));

        let metadata: MetadataV3 =
            serde_json::from_str(r#"{"name": "zstd", "configuration": {"level": 23}}"#).unwrap();
        assert!(create_codec_zstd(&metadata).is_err());
    }

    #[test]
    fn codec_zstd_round_trip() {
        let elements: Vec<u32> = (0..256).map(|i| i / 4).collect();
        let bytes = bytemuck::cast_slice::<u32, u8>(&elements).to_vec();
        let bytes_representation = BytesRepresentation::FixedSize(bytes.len() as u64);

        for checksum in [false, true] {
            let codec = ZstdCodec::new(5.into(), checksum);
            let encoded = codec.encode(bytes.clone().into()).unwrap();
            assert!(encoded.len() < bytes.len());
            let decoded = codec.decode(encoded, &bytes_representation).unwrap();
            assert_eq!(decoded.to_vec(), bytes);
        }
    }

    #[test]
    fn codec_zstd_checksum_detects_corruption() {
        let bytes: Vec<u8> = (0..=255).collect();
        let codec = ZstdCodec::new(0.into(), true);
        let mut encoded = codec.encode(bytes.into()).unwrap().to_vec();
        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;
        assert!(codec
            .decode(encoded.into(), &BytesRepresentation::UnboundedSize)
            .is_err());
    }
}
