//! The `zfp` array to bytes codec.
//!
//! [zfp](https://zfp.io/) is a compressed number format for 1D to 4D arrays of 32/64-bit floating point or integer data.
//! Unsigned integers are compressed as signed integers of the same size.
//!
//! If `write_header` is true, a full zfp header precedes the compressed stream and decoding takes its parameters from the header.
//! This is the encoding of the `numcodecs` `zfpy` codec, see [`zfpy`](super::zfpy).
//!
//! This codec requires the `zfp` feature, which is disabled by default.
//!
//! ### Example `JSON` metadata
//! ```json
//! {
//!     "name": "zfp",
//!     "configuration": {
//!         "mode": "fixed_accuracy",
//!         "tolerance": 0.01
//!     }
//! }
//! ```

mod zfp_bitstream;
mod zfp_codec;
mod zfp_field;
mod zfp_stream;

pub use crate::metadata::v3::codec::zfp::{
    ZfpCodecConfiguration, ZfpCodecConfigurationV1, ZfpMode, IDENTIFIER,
};
pub use zfp_codec::ZfpCodec;

use zfp_sys::{
    zfp_type, zfp_type_zfp_type_double, zfp_type_zfp_type_float, zfp_type_zfp_type_int32,
    zfp_type_zfp_type_int64,
};

use crate::{
    array::{
        codec::{Codec, CodecError, CodecPlugin},
        DataType,
    },
    metadata::v3::MetadataV3,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_zfp, create_codec_zfp)
}

fn is_name_zfp(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

pub(crate) fn create_codec_zfp(metadata: &MetadataV3) -> Result<Codec, PluginCreateError> {
    let configuration: ZfpCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(ZfpCodec::new_with_configuration(&configuration));
    Ok(Codec::ArrayToBytes(codec))
}

fn data_type_to_zfp_type(data_type: &DataType) -> Result<zfp_type, CodecError> {
    match data_type {
        DataType::Int32 | DataType::UInt32 => Ok(zfp_type_zfp_type_int32),
        DataType::Int64 | DataType::UInt64 => Ok(zfp_type_zfp_type_int64),
        DataType::Float32 => Ok(zfp_type_zfp_type_float),
        DataType::Float64 => Ok(zfp_type_zfp_type_double),
        _ => Err(CodecError::UnsupportedDataType(
            data_type.clone(),
            IDENTIFIER.to_string(),
        )),
    }
}

#[allow(non_upper_case_globals)]
const fn zfp_type_size(zfp_type: zfp_type) -> Option<usize> {
    match zfp_type {
        zfp_type_zfp_type_int32 | zfp_type_zfp_type_float => Some(4),
        zfp_type_zfp_type_int64 | zfp_type_zfp_type_double => Some(8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::array::{
        codec::{ArrayToBytesCodecTraits, CodecTraits},
        ArrayBytes, ChunkRepresentation, FillValue,
    };

    use super::*;

    fn round_trip<T: bytemuck::Pod>(
        codec: &ZfpCodec,
        shape: Vec<u64>,
        data_type: DataType,
        elements: &[T],
    ) -> Vec<T> {
        let representation = ChunkRepresentation::new(
            &shape.try_into().unwrap(),
            data_type.clone(),
            data_type.default_fill_value(),
        );
        let bytes = ArrayBytes::new_flen(bytemuck::cast_slice::<T, u8>(elements).to_vec());
        let encoded = codec.encode(bytes, &representation).unwrap();
        let decoded = codec.decode(encoded, &representation).unwrap();
        bytemuck::pod_collect_to_vec::<u8, T>(&decoded.into_fixed().unwrap())
    }

    #[test]
    fn codec_zfp_reversible() {
        let codec = ZfpCodec::new(ZfpMode::Reversible, false);
        let floats: Vec<f32> = (0..27).map(|i| i as f32 / 3.0).collect();
        assert_eq!(round_trip(&codec, vec![3, 3, 3], DataType::Float32, &floats), floats);
        let doubles: Vec<f64> = (0..10).map(|i| f64::from(i).sqrt()).collect();
        assert_eq!(round_trip(&codec, vec![10], DataType::Float64, &doubles), doubles);
        let ints: Vec<u32> = (0..16).map(|i| i * 1000).collect();
        assert_eq!(round_trip(&codec, vec![2, 2, 2, 2], DataType::UInt32, &ints), ints);
        let longs: Vec<i64> = (0..12).map(|i| i - 6).collect();
        assert_eq!(round_trip(&codec, vec![3, 4], DataType::Int64, &longs), longs);
    }

    #[test]
    fn codec_zfp_fixed_accuracy() {
        let elements: Vec<f32> = (0..25).map(|i| i as f32 * 1.1).collect();
        for write_header in [false, true] {
            let codec = ZfpCodec::new(ZfpMode::FixedAccuracy { tolerance: 0.01 }, write_header);
            let decoded = round_trip(&codec, vec![5, 5], DataType::Float32, &elements);
            for (x, y) in std::iter::zip(&elements, &decoded) {
                assert!((x - y).abs() <= 0.01);
            }
        }
    }

    #[test]
    fn codec_zfp_fixed_rate_and_precision() {
        let elements: Vec<f64> = (0..64).map(|i| f64::from(i).sin()).collect();
        for mode in [
            ZfpMode::FixedRate { rate: 32.0 },
            ZfpMode::FixedPrecision { precision: 40 },
        ] {
            let decoded = round_trip(&ZfpCodec::new(mode, false), vec![8, 8], DataType::Float64, &elements);
            for (x, y) in std::iter::zip(&elements, &decoded) {
                assert!((x - y).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn codec_zfp_header_mismatch() {
        let codec = ZfpCodec::new(ZfpMode::Reversible, true);
        let representation = ChunkRepresentation::new(
            &vec![4].try_into().unwrap(),
            DataType::Float32,
            FillValue::from(0.0f32),
        );
        let encoded = codec
            .encode(ArrayBytes::new_flen(vec![0u8; 16]), &representation)
            .unwrap();
        let other = ChunkRepresentation::new(
            &vec![8].try_into().unwrap(),
            DataType::Float32,
            FillValue::from(0.0f32),
        );
        assert!(codec.decode(encoded, &other).is_err());
    }

    #[test]
    fn codec_zfp_unsupported() {
        let representation = ChunkRepresentation::new(
            &vec![4].try_into().unwrap(),
            DataType::UInt8,
            FillValue::from(0u8),
        );
        let codec = ZfpCodec::new(ZfpMode::Reversible, false);
        assert!(matches!(
            codec.compute_encoded_size(&representation),
            Err(CodecError::UnsupportedDataType(..))
        ));
        let representation = ChunkRepresentation::new(
            &vec![4].try_into().unwrap(),
            DataType::Int32,
            FillValue::from(0i32),
        );
        let codec = ZfpCodec::new(ZfpMode::FixedAccuracy { tolerance: 0.1 }, false);
        assert!(codec
            .encode(ArrayBytes::new_flen(vec![0u8; 16]), &representation)
            .is_err());
    }

    #[test]
    fn codec_zfp_metadata() {
        let metadata: MetadataV3 = serde_json::from_str(
            r#"{"name": "zfp", "configuration": {"mode": "fixed_precision", "precision": 12}}"#,
        )
        .unwrap();
        let Codec::ArrayToBytes(codec) = create_codec_zfp(&metadata).unwrap() else {
            panic!()
        };
        assert_eq!(codec.create_metadata(), Some(metadata));
    }
}
