//! Chunk key encodings.
//!
//! A chunk key encoding maps the grid indices of a chunk to a [`StoreKey`] relative to the array path.
//! - [`DefaultChunkKeyEncoding`] (`default`): the Zarr V3 encoding, `c/1/2` or `c.1.2`, and `c` for a scalar array.
//! - [`V2ChunkKeyEncoding`] (`v2`): the Zarr V2 encoding, `1.2` or `1/2`, and `0` for a scalar array.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/core/v3.0.html#chunk-key-encoding>.

mod default;
mod v2;

pub use default::DefaultChunkKeyEncoding;
pub use v2::V2ChunkKeyEncoding;

use derive_more::{Deref, Display};

use crate::{
    metadata::v3::{chunk_key_encoding as metadata, MetadataV3},
    plugin::PluginCreateError,
    storage::StoreKey,
};

/// A chunk key encoding.
#[derive(Debug, Clone, Deref)]
pub struct ChunkKeyEncoding(Box<dyn ChunkKeyEncodingTraits>);

impl ChunkKeyEncoding {
    /// Create a chunk key encoding.
    pub fn new<T: ChunkKeyEncodingTraits + 'static>(chunk_key_encoding: T) -> Self {
        Self(Box::new(chunk_key_encoding))
    }

    /// Create a chunk key encoding from metadata.
    ///
    /// # Errors
    /// Returns [`PluginCreateError`] if the metadata is invalid or the chunk key encoding is not supported.
    pub fn from_metadata(metadata: &MetadataV3) -> Result<Self, PluginCreateError> {
        match metadata.name() {
            metadata::default::IDENTIFIER => {
                Ok(Self::new(DefaultChunkKeyEncoding::from_metadata(metadata)?))
            }
            metadata::v2::IDENTIFIER => Ok(Self::new(V2ChunkKeyEncoding::from_metadata(metadata)?)),
            name => Err(PluginCreateError::unsupported(name, "chunk key encoding")),
        }
    }
}

impl<T: ChunkKeyEncodingTraits + 'static> From<T> for ChunkKeyEncoding {
    fn from(chunk_key_encoding: T) -> Self {
        Self::new(chunk_key_encoding)
    }
}

/// Chunk key encoding traits.
pub trait ChunkKeyEncodingTraits: dyn_clone::DynClone + core::fmt::Debug + Send + Sync {
    /// Create the metadata of this chunk key encoding.
    fn create_metadata(&self) -> MetadataV3;

    /// Encode chunk grid indices (grid cell coordinates) into a store key.
    fn encode(&self, chunk_grid_indices: &[u64]) -> StoreKey;
}

dyn_clone::clone_trait_object!(ChunkKeyEncodingTraits);

/// A chunk key separator.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum ChunkKeySeparator {
    /// The slash '/' character.
    #[display("/")]
    Slash,
    /// The dot '.' character.
    #[display(".")]
    Dot,
}

impl TryFrom<char> for ChunkKeySeparator {
    type Error = char;

    fn try_from(separator: char) -> Result<Self, Self::Error> {
        match separator {
            '/' => Ok(Self::Slash),
            '.' => Ok(Self::Dot),
            _ => Err(separator),
        }
    }
}

impl serde::Serialize for ChunkKeySeparator {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for ChunkKeySeparator {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let separator = String::deserialize(d)?;
        let mut chars = separator.chars();
        match (chars.next(), chars.next()) {
            (Some(separator), None) => Self::try_from(separator).map_err(|_| {
                serde::de::Error::custom("chunk key separator must be a `.` or `/`")
            }),
            _ => Err(serde::de::Error::custom(
                "chunk key separator must be a `.` or `/`",
            )),
        }
    }
}

/// Join chunk grid indices with a separator.
fn join_indices(chunk_grid_indices: &[u64], separator: ChunkKeySeparator) -> String {
    itertools::join(chunk_grid_indices, &separator.to_string())
}
