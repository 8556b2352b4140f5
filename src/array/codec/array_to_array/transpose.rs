//! The `transpose` array to array codec.
//!
//! Permutes the dimensions of a chunk.
//! Dimension `i` of the encoded chunk is dimension `order[i]` of the decoded chunk.
//!
//! The legacy `"C"` and `"F"` orders are resolved against the chunk dimensionality.
//!
//! This codec requires the `transpose` feature, which is enabled by default.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/transpose/v1.0.html>.
//!
//! ### Example `JSON` metadata
//! ```json
//! {
//!     "name": "transpose",
//!     "configuration": {
//!         "order": [2, 0, 1]
//!     }
//! }
//! ```

mod transpose_codec;

pub use crate::metadata::v3::codec::transpose::{
    InvalidPermutationError, TransposeCodecConfiguration, TransposeCodecConfigurationV1,
    TransposeOrder, IDENTIFIER,
};
pub use transpose_codec::TransposeCodec;

use crate::{
    array::{
        codec::{Codec, CodecError, CodecPlugin},
        ArrayBytes, RawBytes, RawBytesOffsets,
    },
    metadata::v3::MetadataV3,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_transpose, create_codec_transpose)
}

fn is_name_transpose(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

pub(crate) fn create_codec_transpose(metadata: &MetadataV3) -> Result<Codec, PluginCreateError> {
    let configuration: TransposeCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(TransposeCodec::new_with_configuration(&configuration));
    Ok(Codec::ArrayToArray(codec))
}

/// The inverse of `permutation`.
fn inverse_permutation(permutation: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; permutation.len()];
    for (i, axis) in permutation.iter().enumerate() {
        inverse[*axis] = i;
    }
    inverse
}

fn permute<T: Copy>(v: &[T], permutation: &[usize]) -> Vec<T> {
    permutation.iter().map(|axis| v[*axis]).collect()
}

fn shape_usize(shape: &[u64]) -> Result<Vec<usize>, CodecError> {
    shape
        .iter()
        .map(|size| {
            usize::try_from(*size).map_err(|_| CodecError::from("chunk shape exceeds usize::MAX"))
        })
        .collect()
}

/// Permute the axes of fixed size elements with `shape`.
///
/// Each element is kept intact by appending an innermost axis of `bytes_per_element`.
fn transpose_fixed(
    permutation: &[usize],
    shape: &[u64],
    bytes_per_element: usize,
    bytes: &[u8],
) -> Result<Vec<u8>, CodecError> {
    let mut shape = shape_usize(shape)?;
    shape.push(bytes_per_element);
    let mut axes = permutation.to_vec();
    axes.push(permutation.len());
    let array = ndarray::ArrayViewD::<u8>::from_shape(shape, bytes)
        .map_err(|err| CodecError::Other(err.to_string()))?;
    Ok(array.permuted_axes(axes).iter().copied().collect())
}

/// Permute the axes of variable size elements with `shape`.
fn transpose_variable(
    permutation: &[usize],
    shape: &[u64],
    bytes: &RawBytes,
    offsets: &RawBytesOffsets,
) -> Result<ArrayBytes<'static>, CodecError> {
    let shape = shape_usize(shape)?;
    let num_elements = shape.iter().product();
    let indices = ndarray::ArrayD::from_shape_vec(shape, (0..num_elements).collect())
        .map_err(|err| CodecError::Other(err.to_string()))?;

    let mut bytes_new = Vec::with_capacity(bytes.len());
    let mut offsets_new = Vec::with_capacity(offsets.len());
    for index in indices.permuted_axes(permutation.to_vec()).iter() {
        offsets_new.push(bytes_new.len());
        bytes_new.extend_from_slice(&bytes[offsets[*index]..offsets[index + 1]]);
    }
    offsets_new.push(bytes_new.len());
    Ok(ArrayBytes::new_vlen(bytes_new, offsets_new))
}

#[cfg(test)]
mod tests {
    use crate::array::{
        codec::ArrayToArrayCodecTraits, ChunkRepresentation, DataType, FillValue,
    };

    use super::*;

    fn representation(shape: Vec<u64>, data_type: DataType) -> ChunkRepresentation {
        let fill_value = data_type.default_fill_value();
        ChunkRepresentation::new(&shape.try_into().unwrap(), data_type, fill_value)
    }

    #[test]
    fn codec_transpose_fixed() {
        let codec = TransposeCodec::new(TransposeOrder::new(&[1, 0]).unwrap());
        let decoded_representation = representation(vec![2, 3], DataType::UInt16);
        let encoded_representation = codec
            .compute_encoded_representation(&decoded_representation)
            .unwrap();
        assert_eq!(encoded_representation.shape_u64(), vec![3, 2]);

        let elements: Vec<u16> = (0..6).collect();
        let bytes = ArrayBytes::new_flen(bytemuck::cast_slice::<u16, u8>(&elements).to_vec());
        let encoded = codec.encode(bytes.clone(), &decoded_representation).unwrap();
        let encoded_elements: Vec<u16> =
            bytemuck::pod_collect_to_vec::<u8, u16>(&encoded.clone().into_fixed().unwrap());
        assert_eq!(encoded_elements, vec![0, 3, 1, 4, 2, 5]);

        let decoded = codec.decode(encoded, &decoded_representation).unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn codec_transpose_3d_round_trip() {
        let codec = TransposeCodec::new(TransposeOrder::new(&[2, 0, 1]).unwrap());
        let decoded_representation = representation(vec![2, 3, 4], DataType::UInt8);
        assert_eq!(
            codec
                .compute_encoded_representation(&decoded_representation)
                .unwrap()
                .shape_u64(),
            vec![4, 2, 3]
        );
        let bytes = ArrayBytes::new_flen((0..24).collect::<Vec<u8>>());
        let encoded = codec.encode(bytes.clone(), &decoded_representation).unwrap();
        assert_ne!(encoded, bytes);
        let encoded_bytes = encoded.clone().into_fixed().unwrap();
        // encoded[k][i][j] == decoded[i][j][k]
        assert_eq!(encoded_bytes[1], 4);
        assert_eq!(encoded_bytes[6], 1);
        assert_eq!(codec.decode(encoded, &decoded_representation).unwrap(), bytes);
    }

    #[test]
    fn codec_transpose_f_order() {
        let codec = TransposeCodec::new(TransposeOrder::F);
        let decoded_representation = representation(vec![2, 2], DataType::UInt8);
        let encoded = codec
            .encode(ArrayBytes::new_flen(vec![1u8, 2, 3, 4]), &decoded_representation)
            .unwrap();
        assert_eq!(encoded, ArrayBytes::new_flen(vec![1u8, 3, 2, 4]));
    }

    #[test]
    fn codec_transpose_variable() {
        let codec = TransposeCodec::new(TransposeOrder::new(&[1, 0]).unwrap());
        let decoded_representation = ChunkRepresentation::new(
            &vec![2, 2].try_into().unwrap(),
            DataType::String,
            FillValue::from(""),
        );
        let bytes = ArrayBytes::new_vlen(b"abbcccdddd".to_vec(), vec![0, 1, 3, 6, 10]);
        let encoded = codec.encode(bytes.clone(), &decoded_representation).unwrap();
        assert_eq!(
            encoded,
            ArrayBytes::new_vlen(b"acccbbdddd".to_vec(), vec![0, 1, 4, 6, 10])
        );
        assert_eq!(codec.decode(encoded, &decoded_representation).unwrap(), bytes);
    }

    #[test]
    fn codec_transpose_invalid_dimensionality() {
        let codec = TransposeCodec::new(TransposeOrder::new(&[1, 0]).unwrap());
        let decoded_representation = representation(vec![2, 2, 2], DataType::UInt8);
        assert!(codec
            .compute_encoded_representation(&decoded_representation)
            .is_err());
    }

    #[test]
    fn codec_transpose_metadata() {
        let metadata: MetadataV3 =
            serde_json::from_str(r#"{"name": "transpose", "configuration": {"order": [0, 2, 1]}}"#)
                .unwrap();
        let Codec::ArrayToArray(codec) = create_codec_transpose(&metadata).unwrap() else {
            panic!()
        };
        assert_eq!(codec.create_metadata(), Some(metadata));
    }
}
