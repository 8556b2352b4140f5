use std::borrow::Cow;

use itertools::Itertools;

use crate::array_subset::{ArraySubset, IncompatibleArraySubsetAndShapeError};

use super::{codec::CodecError, DataTypeSize, FillValue};

/// Array element bytes.
pub type RawBytes<'a> = Cow<'a, [u8]>;

/// Array element byte offsets.
pub type RawBytesOffsets<'a> = Cow<'a, [usize]>;

/// Fixed or variable length array bytes.
///
/// The bytes of a variable length array are accompanied by element byte offsets, with one more offset than elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayBytes<'a> {
    /// Bytes for a fixed length array.
    Fixed(RawBytes<'a>),
    /// Bytes and element byte offsets for a variable length array.
    Variable(RawBytes<'a>, RawBytesOffsets<'a>),
}

impl<'a> ArrayBytes<'a> {
    /// Create a new fixed length array bytes from `bytes`.
    pub fn new_flen(bytes: impl Into<RawBytes<'a>>) -> Self {
        Self::Fixed(bytes.into())
    }

    /// Create a new variable length array bytes from `bytes` and `offsets`.
    ///
    /// The offsets are not validated, see [`validate`](ArrayBytes::validate).
    pub fn new_vlen(
        bytes: impl Into<RawBytes<'a>>,
        offsets: impl Into<RawBytesOffsets<'a>>,
    ) -> Self {
        Self::Variable(bytes.into(), offsets.into())
    }

    /// Create a new [`ArrayBytes`] with `num_elements` composed entirely of the `fill_value`.
    ///
    /// # Panics
    /// Panics if `num_elements` exceeds [`usize::MAX`].
    #[must_use]
    pub fn new_fill_value(
        num_elements: u64,
        data_type_size: DataTypeSize,
        fill_value: &FillValue,
    ) -> ArrayBytes<'static> {
        let num_elements = usize::try_from(num_elements).unwrap();
        match data_type_size {
            DataTypeSize::Fixed(_) => {
                ArrayBytes::new_flen(fill_value.as_ne_bytes().repeat(num_elements))
            }
            DataTypeSize::Variable => ArrayBytes::new_vlen(
                fill_value.as_ne_bytes().repeat(num_elements),
                (0..=num_elements)
                    .map(|i| i * fill_value.size())
                    .collect::<Vec<_>>(),
            ),
        }
    }

    /// Convert the array bytes into fixed size bytes.
    ///
    /// # Errors
    /// Returns a [`CodecError::ExpectedFixedLengthBytes`] if the bytes are variable length.
    pub fn into_fixed(self) -> Result<RawBytes<'a>, CodecError> {
        match self {
            Self::Fixed(bytes) => Ok(bytes),
            Self::Variable(_, _) => Err(CodecError::ExpectedFixedLengthBytes),
        }
    }

    /// Convert the array bytes into variable sized bytes and element byte offsets.
    ///
    /// # Errors
    /// Returns a [`CodecError::ExpectedVariableLengthBytes`] if the bytes are fixed length.
    pub fn into_variable(self) -> Result<(RawBytes<'a>, RawBytesOffsets<'a>), CodecError> {
        match self {
            Self::Fixed(_) => Err(CodecError::ExpectedVariableLengthBytes),
            Self::Variable(bytes, offsets) => Ok((bytes, offsets)),
        }
    }

    /// Returns the size (in bytes) of the underlying element bytes.
    ///
    /// This excludes the element offsets of variable length bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Fixed(bytes) | Self::Variable(bytes, _) => bytes.len(),
        }
    }

    /// Convert into owned [`ArrayBytes<'_>`].
    #[must_use]
    pub fn into_owned<'b>(self) -> ArrayBytes<'b> {
        match self {
            Self::Fixed(bytes) => ArrayBytes::<'b>::new_flen(bytes.into_owned()),
            Self::Variable(bytes, offsets) => {
                ArrayBytes::<'b>::new_vlen(bytes.into_owned(), offsets.into_owned())
            }
        }
    }

    /// Returns true if every element is bytewise equal to `fill_value`.
    #[must_use]
    pub fn is_fill_value(&self, fill_value: &FillValue) -> bool {
        let fill_value = fill_value.as_ne_bytes();
        match self {
            Self::Fixed(bytes) => {
                !fill_value.is_empty()
                    && bytes.len() % fill_value.len() == 0
                    && bytes
                        .chunks_exact(fill_value.len())
                        .all(|element| element == fill_value)
            }
            Self::Variable(bytes, offsets) => offsets
                .iter()
                .tuple_windows()
                .all(|(&start, &end)| bytes.get(start..end) == Some(fill_value)),
        }
    }

    /// Validate that the array bytes hold `num_elements` elements of `data_type_size`.
    ///
    /// Fixed length bytes must have exactly `num_elements * size` bytes.
    /// Variable length bytes must have `num_elements + 1` monotonically increasing offsets ending at the byte length.
    ///
    /// # Errors
    /// Returns [`CodecError::UnexpectedChunkDecodedSize`] or [`CodecError::InvalidVariableSizedArrayOffsets`] if the bytes are invalid.
    pub fn validate(
        &self,
        num_elements: u64,
        data_type_size: DataTypeSize,
    ) -> Result<(), CodecError> {
        match (self, data_type_size) {
            (Self::Fixed(bytes), DataTypeSize::Fixed(data_type_size)) => {
                let expected = num_elements * data_type_size as u64;
                if bytes.len() as u64 == expected {
                    Ok(())
                } else {
                    Err(CodecError::UnexpectedChunkDecodedSize(bytes.len(), expected))
                }
            }
            (Self::Variable(bytes, offsets), DataTypeSize::Variable) => {
                if offsets.len() as u64 != num_elements + 1
                    || offsets.first().is_some_and(|&first| first != 0)
                    || offsets.last() != Some(&bytes.len())
                    || offsets.iter().tuple_windows().any(|(curr, next)| next < curr)
                {
                    Err(CodecError::InvalidVariableSizedArrayOffsets)
                } else {
                    Ok(())
                }
            }
            (Self::Variable(_, _), DataTypeSize::Fixed(_)) => {
                Err(CodecError::ExpectedFixedLengthBytes)
            }
            (Self::Fixed(_), DataTypeSize::Variable) => {
                Err(CodecError::ExpectedVariableLengthBytes)
            }
        }
    }

    /// Extract the elements of `subset` from array bytes with shape `array_shape`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the `array_shape` is incompatible with `subset` or the bytes are invalid.
    ///
    /// # Panics
    /// Panics if indices in the subset exceed [`usize::MAX`].
    pub fn extract_array_subset(
        &self,
        subset: &ArraySubset,
        array_shape: &[u64],
        data_type_size: DataTypeSize,
    ) -> Result<ArrayBytes<'static>, CodecError> {
        self.validate(array_shape.iter().product(), data_type_size)?;
        let runs = subset.contiguous_linearised_indices(array_shape)?;
        match (self, data_type_size) {
            (Self::Fixed(bytes), DataTypeSize::Fixed(data_type_size)) => {
                let mut subset_bytes =
                    Vec::with_capacity(subset.num_elements_usize() * data_type_size);
                for (index, length) in runs {
                    let start = usize::try_from(index).unwrap() * data_type_size;
                    let end = start + usize::try_from(length).unwrap() * data_type_size;
                    subset_bytes.extend_from_slice(&bytes[start..end]);
                }
                Ok(ArrayBytes::new_flen(subset_bytes))
            }
            (Self::Variable(bytes, offsets), _) => {
                let mut subset_bytes = Vec::new();
                let mut subset_offsets = Vec::with_capacity(subset.num_elements_usize() + 1);
                for (index, length) in runs {
                    let index = usize::try_from(index).unwrap();
                    let length = usize::try_from(length).unwrap();
                    let base = subset_bytes.len();
                    subset_offsets.extend(
                        offsets[index..index + length]
                            .iter()
                            .map(|offset| offset - offsets[index] + base),
                    );
                    subset_bytes.extend_from_slice(&bytes[offsets[index]..offsets[index + length]]);
                }
                subset_offsets.push(subset_bytes.len());
                Ok(ArrayBytes::new_vlen(subset_bytes, subset_offsets))
            }
            (Self::Fixed(_), DataTypeSize::Variable) => Err(CodecError::ExpectedVariableLengthBytes),
        }
    }
}

impl From<Vec<u8>> for ArrayBytes<'_> {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new_flen(bytes)
    }
}

impl<'a> From<&'a [u8]> for ArrayBytes<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new_flen(bytes)
    }
}

impl From<IncompatibleArraySubsetAndShapeError> for CodecError {
    fn from(err: IncompatibleArraySubsetAndShapeError) -> Self {
        Self::InvalidArraySubsetError(err)
    }
}

/// Merge array bytes of subsets into array bytes of shape `output_shape`.
///
/// Each piece is the array bytes of an array subset relative to the output.
/// Later pieces overwrite earlier pieces where they overlap, and elements not covered by any piece are empty (zero bytes for fixed size data types, an empty element for variable size data types).
///
/// This is used to assemble an array subset from chunks, and to merge a partial update into an existing chunk.
///
/// # Errors
/// Returns a [`CodecError`] if a piece is invalid or not within `output_shape`.
///
/// # Panics
/// Panics if the number of elements in `output_shape` exceeds [`usize::MAX`].
pub fn merge_array_bytes(
    output_shape: &[u64],
    pieces: &[(ArraySubset, ArrayBytes<'_>)],
    data_type_size: DataTypeSize,
) -> Result<ArrayBytes<'static>, CodecError> {
    let num_elements = usize::try_from(output_shape.iter().product::<u64>()).unwrap();
    match data_type_size {
        DataTypeSize::Fixed(data_type_size) => {
            let mut output = vec![0u8; num_elements * data_type_size];
            for (subset, bytes) in pieces {
                bytes.validate(subset.num_elements(), DataTypeSize::Fixed(data_type_size))?;
                let ArrayBytes::Fixed(bytes) = bytes else {
                    return Err(CodecError::ExpectedFixedLengthBytes);
                };
                let mut offset = 0;
                for (index, length) in subset.contiguous_linearised_indices(output_shape)? {
                    let start = usize::try_from(index).unwrap() * data_type_size;
                    let length = usize::try_from(length).unwrap() * data_type_size;
                    output[start..start + length].copy_from_slice(&bytes[offset..offset + length]);
                    offset += length;
                }
            }
            Ok(ArrayBytes::new_flen(output))
        }
        DataTypeSize::Variable => {
            let mut elements: Vec<&[u8]> = vec![&[]; num_elements];
            for (subset, bytes) in pieces {
                bytes.validate(subset.num_elements(), DataTypeSize::Variable)?;
                let ArrayBytes::Variable(bytes, offsets) = bytes else {
                    return Err(CodecError::ExpectedVariableLengthBytes);
                };
                let mut element = 0;
                for (index, length) in subset.contiguous_linearised_indices(output_shape)? {
                    let index = usize::try_from(index).unwrap();
                    for output_element in &mut elements[index..index + usize::try_from(length).unwrap()] {
                        *output_element = &bytes[offsets[element]..offsets[element + 1]];
                        element += 1;
                    }
                }
            }
            let mut offsets = Vec::with_capacity(num_elements + 1);
            let mut output = Vec::with_capacity(elements.iter().map(|element| element.len()).sum());
            for element in elements {
                offsets.push(output.len());
                output.extend_from_slice(element);
            }
            offsets.push(output.len());
            Ok(ArrayBytes::new_vlen(output, offsets))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_bytes_validate() {
        let bytes = ArrayBytes::new_flen(vec![0u8; 8]);
        assert!(bytes.validate(2, DataTypeSize::Fixed(4)).is_ok());
        assert!(matches!(
            bytes.validate(3, DataTypeSize::Fixed(4)),
            Err(CodecError::UnexpectedChunkDecodedSize(8, 12))
        ));

        let bytes = ArrayBytes::new_vlen(b"abbb".to_vec(), vec![0, 1, 4]);
        assert!(bytes.validate(2, DataTypeSize::Variable).is_ok());
        assert!(bytes.validate(3, DataTypeSize::Variable).is_err());
        let bytes = ArrayBytes::new_vlen(b"abbb".to_vec(), vec![0, 3, 1, 4]);
        assert!(bytes.validate(3, DataTypeSize::Variable).is_err());
    }

    #[test]
    fn array_bytes_fill_value() {
        let bytes = ArrayBytes::new_fill_value(3, DataTypeSize::Variable, &FillValue::from("ab"));
        assert_eq!(bytes, ArrayBytes::new_vlen(b"ababab".to_vec(), vec![0, 2, 4, 6]));
        let bytes = ArrayBytes::new_fill_value(2, DataTypeSize::Fixed(2), &FillValue::from(1u16));
        assert_eq!(bytes.size(), 4);
        assert!(bytes.is_fill_value(&FillValue::from(1u16)));
        assert!(!bytes.is_fill_value(&FillValue::from(0u16)));
        assert!(!ArrayBytes::new_flen(vec![1u8, 0, 1, 1]).is_fill_value(&FillValue::from(1u16)));
        assert!(ArrayBytes::new_vlen(vec![], vec![0, 0, 0]).is_fill_value(&FillValue::from("")));
        assert!(!ArrayBytes::new_vlen(b"a".to_vec(), vec![0, 0, 1]).is_fill_value(&FillValue::from("")));
    }

    #[test]
    fn array_bytes_extract_array_subset() {
        let bytes = ArrayBytes::new_flen((0u8..16).collect::<Vec<_>>());
        let subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        let extracted = bytes
            .extract_array_subset(&subset, &[4, 4], DataTypeSize::Fixed(1))
            .unwrap();
        assert_eq!(extracted, ArrayBytes::new_flen(vec![5, 6, 9, 10]));

        let bytes = ArrayBytes::new_vlen(b"abbcccdddd".to_vec(), vec![0, 1, 3, 6, 10]);
        let subset = ArraySubset::new_with_ranges(&[0..1, 1..2]);
        let extracted = bytes
            .extract_array_subset(&subset, &[2, 2], DataTypeSize::Variable)
            .unwrap();
        assert_eq!(extracted, ArrayBytes::new_vlen(b"bb".to_vec(), vec![0, 2]));
    }

    #[test]
    fn array_bytes_merge_fixed() {
        let chunk = ArrayBytes::new_flen(vec![0u8; 9]);
        let update = ArrayBytes::new_flen(vec![1u8, 2, 3, 4]);
        let merged = merge_array_bytes(
            &[3, 3],
            &[
                (ArraySubset::new_with_shape(vec![3, 3]), chunk),
                (ArraySubset::new_with_ranges(&[1..3, 0..2]), update),
            ],
            DataTypeSize::Fixed(1),
        )
        .unwrap();
        assert_eq!(
            merged,
            ArrayBytes::new_flen(vec![0, 0, 0, 1, 2, 0, 3, 4, 0])
        );
    }

    #[test]
    fn array_bytes_merge_variable() {
        let chunk = ArrayBytes::new_vlen(b"abc".to_vec(), vec![0, 1, 2, 3]);
        let update = ArrayBytes::new_vlen(b"xyz".to_vec(), vec![0, 3]);
        let merged = merge_array_bytes(
            &[3],
            &[
                (ArraySubset::new_with_shape(vec![3]), chunk),
                (ArraySubset::new_with_ranges(&[1..2]), update),
            ],
            DataTypeSize::Variable,
        )
        .unwrap();
        assert_eq!(merged, ArrayBytes::new_vlen(b"axyzc".to_vec(), vec![0, 1, 4, 5]));

        assert!(merge_array_bytes(
            &[3],
            &[(ArraySubset::new_with_ranges(&[2..4]), ArrayBytes::new_vlen(b"".to_vec(), vec![0, 0, 0]))],
            DataTypeSize::Variable,
        )
        .is_err());
    }
}
