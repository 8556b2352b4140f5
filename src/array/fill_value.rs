//! Fill values.
//!
//! A [`FillValue`] is the element value of the uninitialised portions of an array, stored as native endian element bytes.
//! The fill value of a variable-length string is its UTF-8 bytes, so an empty string has an empty fill value.

/// The fill value of an array.
///
/// Provides an element value to use for uninitialised portions of the array.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FillValue(Vec<u8>);

impl core::fmt::Display for FillValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<Vec<u8>> for FillValue {
    fn from(value: Vec<u8>) -> Self {
        FillValue(value)
    }
}

impl From<bool> for FillValue {
    fn from(value: bool) -> Self {
        FillValue(vec![u8::from(value)])
    }
}

macro_rules! impl_from_ne_bytes {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FillValue {
                fn from(value: $t) -> Self {
                    FillValue(value.to_ne_bytes().to_vec())
                }
            }
        )*
    };
}

impl_from_ne_bytes!(u8, u16, u32, u64, i8, i16, i32, i64, half::f16, f32, f64);

impl From<&str> for FillValue {
    fn from(value: &str) -> Self {
        FillValue(value.as_bytes().to_vec())
    }
}

impl From<String> for FillValue {
    fn from(value: String) -> Self {
        FillValue(value.into_bytes())
    }
}

impl FillValue {
    /// Create a new fill value composed of `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> FillValue {
        FillValue(bytes)
    }

    /// Returns the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the byte representation of the fill value.
    #[must_use]
    pub fn as_ne_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_value() {
        assert_eq!(FillValue::from(1u16).as_ne_bytes(), 1u16.to_ne_bytes());
        assert_eq!(FillValue::from(true).as_ne_bytes(), &[1]);
        assert_eq!(FillValue::from("ab").as_ne_bytes(), b"ab");
        assert_eq!(FillValue::from("").size(), 0);
    }
}
