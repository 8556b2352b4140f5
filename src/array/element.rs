//! Conversion between Rust element types and [`ArrayBytes`].
//!
//! [`Element`] is implemented for the Rust types that can be stored in an array of a given [`DataType`]:
//!
//! | Rust type | Data types |
//! |---|---|
//! | `bool` | `Bool` |
//! | `i8`, `i16`, `i32`, `u8`, `u16`, `u32`, `u64` | the matching integer type |
//! | `i64` | `Int64`, `NumpyDateTime64`, `NumpyTimeDelta64` |
//! | `half::f16`, `f32`, `f64` | the matching float type |
//! | `String`, `&str` | `String`, `FixedLengthUtf32` |

use thiserror::Error;

use super::{
    data_type::{string_to_utf32, utf32_to_string},
    ArrayBytes, DataType,
};

/// An element error.
#[derive(Clone, Debug, Error)]
pub enum ElementError {
    /// Incompatible element type for data type.
    #[error("incompatible element type for data type")]
    IncompatibleElementType,
    /// Invalid element value.
    #[error("invalid element value")]
    InvalidElementValue,
    /// Expected fixed length bytes.
    #[error("expected fixed length array bytes")]
    ExpectedFixedLengthBytes,
    /// Expected variable length bytes.
    #[error("expected variable length array bytes")]
    ExpectedVariableLengthBytes,
}

/// A trait representing an array element type.
pub trait Element: Sized + Clone {
    /// Validate the data type.
    ///
    /// # Errors
    /// Returns an [`ElementError::IncompatibleElementType`] if the data type is incompatible with [`Element`].
    fn validate_data_type(data_type: &DataType) -> Result<(), ElementError>;

    /// Convert a slice of elements into [`ArrayBytes`].
    ///
    /// # Errors
    /// Returns an [`ElementError`] if the data type is incompatible with [`Element`] or an element cannot be represented.
    fn to_array_bytes<'a>(
        data_type: &DataType,
        elements: &'a [Self],
    ) -> Result<ArrayBytes<'a>, ElementError>;

    /// Convert a vector of elements into [`ArrayBytes`].
    ///
    /// Avoids an extra copy compared to [`Element::to_array_bytes`] where possible.
    ///
    /// # Errors
    /// Returns an [`ElementError`] if the data type is incompatible with [`Element`] or an element cannot be represented.
    fn into_array_bytes(
        data_type: &DataType,
        elements: Vec<Self>,
    ) -> Result<ArrayBytes<'static>, ElementError> {
        Ok(Self::to_array_bytes(data_type, &elements)?.into_owned())
    }
}

/// A trait representing an owned array element type.
pub trait ElementOwned: Element {
    /// Convert bytes into a [`Vec<ElementOwned>`].
    ///
    /// # Errors
    /// Returns an [`ElementError`] if the data type is incompatible with [`Element`] or the bytes hold an invalid element.
    fn from_array_bytes(
        data_type: &DataType,
        bytes: ArrayBytes<'_>,
    ) -> Result<Vec<Self>, ElementError>;
}

fn into_fixed(bytes: ArrayBytes<'_>) -> Result<super::RawBytes<'_>, ElementError> {
    bytes
        .into_fixed()
        .map_err(|_| ElementError::ExpectedFixedLengthBytes)
}

macro_rules! impl_element_pod {
    ($raw_type:ty, $($data_type:pat_param)|+) => {
        impl Element for $raw_type {
            fn validate_data_type(data_type: &DataType) -> Result<(), ElementError> {
                match data_type {
                    $($data_type)|+ => Ok(()),
                    _ => Err(ElementError::IncompatibleElementType),
                }
            }

            fn to_array_bytes<'a>(
                data_type: &DataType,
                elements: &'a [Self],
            ) -> Result<ArrayBytes<'a>, ElementError> {
                Self::validate_data_type(data_type)?;
                Ok(ArrayBytes::new_flen(bytemuck::must_cast_slice::<$raw_type, u8>(elements)))
            }

            fn into_array_bytes(
                data_type: &DataType,
                elements: Vec<Self>,
            ) -> Result<ArrayBytes<'static>, ElementError> {
                Self::validate_data_type(data_type)?;
                let bytes = bytemuck::allocation::try_cast_vec(elements).unwrap_or_else(
                    |(_, elements)| bytemuck::must_cast_slice::<$raw_type, u8>(&elements).to_vec(),
                );
                Ok(ArrayBytes::new_flen(bytes))
            }
        }

        impl ElementOwned for $raw_type {
            fn from_array_bytes(
                data_type: &DataType,
                bytes: ArrayBytes<'_>,
            ) -> Result<Vec<Self>, ElementError> {
                Self::validate_data_type(data_type)?;
                let bytes = into_fixed(bytes)?;
                if bytes.len() % std::mem::size_of::<$raw_type>() != 0 {
                    return Err(ElementError::InvalidElementValue);
                }
                Ok(bytemuck::pod_collect_to_vec(&bytes))
            }
        }
    };
}

impl_element_pod!(i8, DataType::Int8);
impl_element_pod!(i16, DataType::Int16);
impl_element_pod!(i32, DataType::Int32);
impl_element_pod!(
    i64,
    DataType::Int64 | DataType::NumpyDateTime64 { .. } | DataType::NumpyTimeDelta64 { .. }
);
impl_element_pod!(u8, DataType::UInt8);
impl_element_pod!(u16, DataType::UInt16);
impl_element_pod!(u32, DataType::UInt32);
impl_element_pod!(u64, DataType::UInt64);
impl_element_pod!(half::f16, DataType::Float16);
impl_element_pod!(f32, DataType::Float32);
impl_element_pod!(f64, DataType::Float64);

impl Element for bool {
    fn validate_data_type(data_type: &DataType) -> Result<(), ElementError> {
        match data_type {
            DataType::Bool => Ok(()),
            _ => Err(ElementError::IncompatibleElementType),
        }
    }

    fn to_array_bytes<'a>(
        data_type: &DataType,
        elements: &'a [Self],
    ) -> Result<ArrayBytes<'a>, ElementError> {
        Self::validate_data_type(data_type)?;
        Ok(ArrayBytes::new_flen(
            elements.iter().map(|&element| u8::from(element)).collect::<Vec<_>>(),
        ))
    }
}

impl ElementOwned for bool {
    fn from_array_bytes(
        data_type: &DataType,
        bytes: ArrayBytes<'_>,
    ) -> Result<Vec<Self>, ElementError> {
        Self::validate_data_type(data_type)?;
        into_fixed(bytes)?
            .iter()
            .map(|byte| match byte {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(ElementError::InvalidElementValue),
            })
            .collect()
    }
}

fn strings_to_array_bytes<T: AsRef<str>>(
    data_type: &DataType,
    elements: &[T],
) -> Result<ArrayBytes<'static>, ElementError> {
    match data_type {
        DataType::String => {
            let mut bytes = Vec::with_capacity(
                elements.iter().map(|element| element.as_ref().len()).sum(),
            );
            let mut offsets = Vec::with_capacity(elements.len() + 1);
            for element in elements {
                offsets.push(bytes.len());
                bytes.extend_from_slice(element.as_ref().as_bytes());
            }
            offsets.push(bytes.len());
            Ok(ArrayBytes::new_vlen(bytes, offsets))
        }
        DataType::FixedLengthUtf32(length) => {
            let mut bytes = Vec::with_capacity(elements.len() * *length as usize * 4);
            for element in elements {
                bytes.extend(
                    string_to_utf32(element.as_ref(), *length)
                        .ok_or(ElementError::InvalidElementValue)?,
                );
            }
            Ok(ArrayBytes::new_flen(bytes))
        }
        _ => Err(ElementError::IncompatibleElementType),
    }
}

impl Element for &str {
    fn validate_data_type(data_type: &DataType) -> Result<(), ElementError> {
        match data_type {
            DataType::String | DataType::FixedLengthUtf32(_) => Ok(()),
            _ => Err(ElementError::IncompatibleElementType),
        }
    }

    fn to_array_bytes<'a>(
        data_type: &DataType,
        elements: &'a [Self],
    ) -> Result<ArrayBytes<'a>, ElementError> {
        strings_to_array_bytes(data_type, elements)
    }
}

impl Element for String {
    fn validate_data_type(data_type: &DataType) -> Result<(), ElementError> {
        <&str>::validate_data_type(data_type)
    }

    fn to_array_bytes<'a>(
        data_type: &DataType,
        elements: &'a [Self],
    ) -> Result<ArrayBytes<'a>, ElementError> {
        strings_to_array_bytes(data_type, elements)
    }
}

impl ElementOwned for String {
    fn from_array_bytes(
        data_type: &DataType,
        bytes: ArrayBytes<'_>,
    ) -> Result<Vec<Self>, ElementError> {
        match data_type {
            DataType::String => {
                let (bytes, offsets) = bytes
                    .into_variable()
                    .map_err(|_| ElementError::ExpectedVariableLengthBytes)?;
                offsets
                    .windows(2)
                    .map(|window| {
                        let element = bytes
                            .get(window[0]..window[1])
                            .ok_or(ElementError::InvalidElementValue)?;
                        String::from_utf8(element.to_vec())
                            .map_err(|_| ElementError::InvalidElementValue)
                    })
                    .collect()
            }
            DataType::FixedLengthUtf32(length) => {
                let element_size = *length as usize * 4;
                let bytes = into_fixed(bytes)?;
                if element_size == 0 {
                    return Ok(vec![]);
                }
                bytes
                    .chunks(element_size)
                    .map(|element| {
                        if element.len() == element_size {
                            utf32_to_string(element).ok_or(ElementError::InvalidElementValue)
                        } else {
                            Err(ElementError::InvalidElementValue)
                        }
                    })
                    .collect()
            }
            _ => Err(ElementError::IncompatibleElementType),
        }
    }
}
