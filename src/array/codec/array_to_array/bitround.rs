//! The `bitround` array to array codec.
//!
//! Rounds the mantissa of floating point data types to the specified number of bits, which makes the data more compressible by a subsequent bytes to bytes codec.
//! Integer data types are rounded to `keepbits` bits counted from the most significant set bit of each element.
//! Rounding is to nearest with ties to even.
//!
//! This codec is lossy: for a float element `x`, the decoded value `y` satisfies `|y - x| <= |x| * 2^-keepbits`.
//! Decoding is the identity.
//!
//! This codec requires the `bitround` feature, which is enabled by default.
//!
//! ### Example `JSON` metadata
//! ```json
//! {
//!     "name": "bitround",
//!     "configuration": {
//!         "keepbits": 10
//!     }
//! }
//! ```

mod bitround_codec;

pub use crate::metadata::v3::codec::bitround::{
    BitroundCodecConfiguration, BitroundCodecConfigurationV1, IDENTIFIER,
};
pub use bitround_codec::BitroundCodec;

use crate::{
    array::{
        codec::{Codec, CodecPlugin},
        DataType,
    },
    metadata::v3::MetadataV3,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_bitround, create_codec_bitround)
}

fn is_name_bitround(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

pub(crate) fn create_codec_bitround(metadata: &MetadataV3) -> Result<Codec, PluginCreateError> {
    let configuration: BitroundCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(BitroundCodec::new_with_configuration(&configuration));
    Ok(Codec::ArrayToArray(codec))
}

macro_rules! round_bits {
    ($fn:ident, $t:ty) => {
        /// Round to `keepbits` of the low `maxbits` bits, with ties to even.
        const fn $fn(input: $t, keepbits: u32, maxbits: u32) -> $t {
            if keepbits >= maxbits {
                return input;
            }
            let maskbits = maxbits - keepbits;
            if maskbits >= <$t>::BITS {
                return 0;
            }
            let mask = (<$t>::MAX >> maskbits) << maskbits;
            let half_quantum1 = (1 << (maskbits - 1)) - 1;
            input.saturating_add(((input >> maskbits) & 1) + half_quantum1) & mask
        }
    };
}

round_bits!(round_bits8, u8);
round_bits!(round_bits16, u16);
round_bits!(round_bits32, u32);
round_bits!(round_bits64, u64);

macro_rules! round_elements {
    ($bytes:expr, $t:ty, $round:ident, $keepbits:expr, $maxbits:expr) => {
        for element in $bytes.chunks_exact_mut(std::mem::size_of::<$t>()) {
            let mut value = [0; std::mem::size_of::<$t>()];
            value.copy_from_slice(element);
            let value = <$t>::from_ne_bytes(value);
            let maxbits: fn($t) -> u32 = $maxbits;
            let rounded = $round(value, $keepbits, maxbits(value));
            element.copy_from_slice(&rounded.to_ne_bytes());
        }
    };
}

/// Round the native endian elements of `bytes` in place.
///
/// Floats keep `keepbits` mantissa bits.
/// Integers keep `keepbits` bits starting from the most significant set bit.
/// Other data types are left unchanged.
fn round_bytes(bytes: &mut [u8], data_type: &DataType, keepbits: u32) {
    match data_type {
        DataType::Float16 => round_elements!(bytes, u16, round_bits16, keepbits, |_| 10),
        DataType::Float32 => round_elements!(bytes, u32, round_bits32, keepbits, |_| 23),
        DataType::Float64 => round_elements!(bytes, u64, round_bits64, keepbits, |_| 52),
        DataType::UInt8 | DataType::Int8 => {
            round_elements!(bytes, u8, round_bits8, keepbits, |v| u8::BITS - v.leading_zeros());
        }
        DataType::UInt16 | DataType::Int16 => {
            round_elements!(bytes, u16, round_bits16, keepbits, |v| u16::BITS - v.leading_zeros());
        }
        DataType::UInt32 | DataType::Int32 => {
            round_elements!(bytes, u32, round_bits32, keepbits, |v| u32::BITS - v.leading_zeros());
        }
        DataType::UInt64 | DataType::Int64 => {
            round_elements!(bytes, u64, round_bits64, keepbits, |v| u64::BITS - v.leading_zeros());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::array::{
        codec::ArrayToArrayCodecTraits, ArrayBytes, ChunkRepresentation, DataType, FillValue,
    };

    use super::*;

    fn encode<T: bytemuck::Pod>(keepbits: u32, data_type: DataType, elements: &[T]) -> Vec<T> {
        let codec = BitroundCodec::new(keepbits);
        let representation = ChunkRepresentation::new(
            &vec![elements.len() as u64].try_into().unwrap(),
            data_type.clone(),
            data_type.default_fill_value(),
        );
        let bytes = ArrayBytes::new_flen(bytemuck::cast_slice::<T, u8>(elements).to_vec());
        let encoded = codec.encode(bytes, &representation).unwrap();
        let decoded = codec.decode(encoded, &representation).unwrap();
        bytemuck::pod_collect_to_vec::<u8, T>(&decoded.into_fixed().unwrap())
    }

    #[test]
    fn codec_bitround_float32() {
        let elements: Vec<f32> = vec![0.0, 1.0, 1.3, 1.5, -3.14159, 1234.5678, 1e-20, 7.1e20];
        for keepbits in [1, 3, 7, 10] {
            let decoded = encode(keepbits, DataType::Float32, &elements);
            for (x, y) in std::iter::zip(&elements, &decoded) {
                assert!((y - x).abs() <= x.abs() * 2f32.powi(-(keepbits as i32)));
            }
        }
        assert_eq!(encode(2, DataType::Float32, &[1.3f32]), vec![1.25f32]);
        assert_eq!(encode(23, DataType::Float32, &elements), elements);
    }

    #[test]
    fn codec_bitround_float64() {
        let elements: Vec<f64> = vec![0.0, 1.1, -2.2, 33.3, 1e300];
        let decoded = encode(6, DataType::Float64, &elements);
        for (x, y) in std::iter::zip(&elements, &decoded) {
            assert!((y - x).abs() <= x.abs() * 2f64.powi(-6));
        }
        let nan = encode(6, DataType::Float64, &[f64::NAN]);
        assert!(nan[0].is_nan());
    }

    #[test]
    fn codec_bitround_float16() {
        let elements = vec![half::f16::from_f32(1.3), half::f16::from_f32(-100.7)];
        let decoded = encode(4, DataType::Float16, &elements);
        for (x, y) in std::iter::zip(&elements, &decoded) {
            let (x, y) = (x.to_f32(), y.to_f32());
            assert!((y - x).abs() <= x.abs() * 2f32.powi(-4));
        }
    }

    #[test]
    fn codec_bitround_uint8() {
        assert_eq!(encode(2, DataType::UInt8, &[0b0101_1010u8]), vec![0b0110_0000u8]);
        let elements: Vec<u8> = vec![0, 3, 7, 15, 17, 54, 89, 128, 255];
        assert_eq!(
            encode(3, DataType::UInt8, &elements),
            vec![0, 3, 7, 16, 16, 56, 96, 128, 224]
        );
    }

    #[test]
    fn codec_bitround_integers() {
        assert_eq!(encode(3, DataType::UInt16, &[1000u16]), vec![1024u16]);
        assert_eq!(encode(3, DataType::Int32, &[12345i32, 7]), vec![12288i32, 7]);
        assert_eq!(encode(2, DataType::UInt64, &[0b1011u64 << 40]), vec![0b1100u64 << 40]);
        assert_eq!(encode(16, DataType::Int64, &[123_456i64]), vec![123_456i64]);
    }

    #[test]
    fn codec_bitround_variable_size_unsupported() {
        let codec = BitroundCodec::new(2);
        let representation = ChunkRepresentation::new(
            &vec![1].try_into().unwrap(),
            DataType::String,
            FillValue::from(""),
        );
        assert!(codec.compute_encoded_representation(&representation).is_err());
    }

    #[test]
    fn codec_bitround_metadata() {
        let metadata: MetadataV3 =
            serde_json::from_str(r#"{"name": "bitround", "configuration": {"keepbits": 4}}"#)
                .unwrap();
        let Codec::ArrayToArray(codec) = create_codec_bitround(&metadata).unwrap() else {
            panic!()
        };
        assert_eq!(codec.create_metadata(), Some(metadata));
    }
}
