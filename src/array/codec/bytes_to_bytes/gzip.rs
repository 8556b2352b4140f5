//! The `gzip` bytes to bytes codec.
//!
//! Applies [gzip](https://datatracker.ietf.org/doc/html/rfc1952) compression with [`flate2`].
//!
//! This codec requires the `gzip` feature, which is enabled by default.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/gzip/v1.0.html>.
//!
//! ### Example `JSON` metadata
//! ```json
//! {
//!     "name": "gzip",
//!     "configuration": {
//!         "level": 1
//!     }
//! }
//! ```

mod gzip_codec;

pub use crate::metadata::v3::codec::gzip::{
    GzipCodecConfiguration, GzipCodecConfigurationV1, GzipCompressionLevel,
    GzipCompressionLevelError, IDENTIFIER,
};
pub use gzip_codec::GzipCodec;

use crate::{
    array::codec::{Codec, CodecPlugin},
    metadata::v3::MetadataV3,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_gzip, create_codec_gzip)
}

fn is_name_gzip(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

pub(crate) fn create_codec_gzip(metadata: &MetadataV3) -> Result<Codec, PluginCreateError> {
    let configuration: GzipCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(GzipCodec::new_with_configuration(&configuration));
    Ok(Codec::BytesToBytes(codec))
}

#[cfg(test)]
mod tests {
    use crate::array::{
        codec::{BytesToBytesCodecTraits, CodecTraits},
        BytesRepresentation,
    };

    use super::*;

    #[test]
    fn codec_gzip_configuration() {
        let metadata: MetadataV3 =
            serde_json::from_str(r#"{"name": "gzip", "configuration": {"level": 10}}"#).unwrap();
        assert!(create_codec_gzip(&metadata).is_err());
        let metadata: MetadataV3 =
            serde_json::from_str(r#"{"name": "gzip", "configuration": {"level": 1}}"#).unwrap();
        let Codec::BytesToBytes(codec) = create_codec_gzip(&metadata).unwrap() else {
            panic!()
        };
        assert_eq!(codec.create_metadata(), Some(metadata));
    }

    #[test]
    fn codec_gzip_round_trip() {
        let elements: Vec<u16> = (0..512).map(|i| i % 7).collect();
        let bytes = bytemuck::cast_slice::<u16, u8>(&elements).to_vec();
        let bytes_representation = BytesRepresentation::FixedSize(bytes.len() as u64);

        let codec = GzipCodec::new(5).unwrap();
        let encoded = codec.encode(bytes.clone().into()).unwrap();
        assert!(encoded.len() < bytes.len());
        // gzip magic number
        assert_eq!(&encoded[..2], &[0x1f_u8, 0x8b]);
        let decoded = codec.decode(encoded, &bytes_representation).unwrap();
        assert_eq!(decoded.to_vec(), bytes);
    }

    #[test]
    fn codec_gzip_decode_invalid() {
        let codec = GzipCodec::new(1).unwrap();
        assert!(codec
            .decode(vec![1u8, 2, 3].into(), &BytesRepresentation::UnboundedSize)
            .is_err());
    }
}
