use crate::{
    metadata::v3::{
        chunk_key_encoding::default::{DefaultChunkKeyEncodingConfiguration, IDENTIFIER},
        MetadataConfiguration, MetadataV3,
    },
    plugin::{PluginCreateError, PluginMetadataInvalidError},
    storage::StoreKey,
};

use super::{join_indices, ChunkKeyEncodingTraits, ChunkKeySeparator};

/// A `default` chunk key encoding.
///
/// The key for a chunk with grid index (k, j, i, …) is formed by taking the initial prefix `c`, and appending for each dimension:
/// - the separator character, followed by,
/// - the ASCII decimal string representation of the chunk index within that dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultChunkKeyEncoding {
    separator: ChunkKeySeparator,
}

impl DefaultChunkKeyEncoding {
    /// Create a new `default` chunk key encoding with separator `separator`.
    #[must_use]
    pub const fn new(separator: ChunkKeySeparator) -> Self {
        Self { separator }
    }

    /// Create a new `default` chunk key encoding with separator `.`.
    #[must_use]
    pub const fn new_dot() -> Self {
        Self::new(ChunkKeySeparator::Dot)
    }

    /// Create a new `default` chunk key encoding with separator `/`.
    #[must_use]
    pub const fn new_slash() -> Self {
        Self::new(ChunkKeySeparator::Slash)
    }

    pub(super) fn from_metadata(metadata: &MetadataV3) -> Result<Self, PluginCreateError> {
        let configuration: DefaultChunkKeyEncodingConfiguration =
            metadata.to_configuration().map_err(|_| {
                PluginMetadataInvalidError::new(IDENTIFIER, "chunk key encoding", metadata.clone())
            })?;
        Ok(Self::new(configuration.separator))
    }
}

impl Default for DefaultChunkKeyEncoding {
    /// Create a `default` chunk key encoding with default separator: `/`.
    fn default() -> Self {
        Self::new_slash()
    }
}

impl ChunkKeyEncodingTraits for DefaultChunkKeyEncoding {
    fn create_metadata(&self) -> MetadataV3 {
        let mut configuration = MetadataConfiguration::new();
        configuration.insert("separator".to_string(), self.separator.to_string().into());
        MetadataV3::new_with_configuration(IDENTIFIER, configuration)
    }

    fn encode(&self, chunk_grid_indices: &[u64]) -> StoreKey {
        if chunk_grid_indices.is_empty() {
            StoreKey::new_unchecked("c")
        } else {
            StoreKey::new_unchecked(format!(
                "c{}{}",
                self.separator,
                join_indices(chunk_grid_indices, self.separator)
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_nd() {
        let key = DefaultChunkKeyEncoding::new_slash().encode(&[1, 23, 45]);
        assert_eq!(key, StoreKey::new("c/1/23/45").unwrap());
    }

    #[test]
    fn dot_nd() {
        let key = DefaultChunkKeyEncoding::new_dot().encode(&[1, 23, 45]);
        assert_eq!(key, StoreKey::new("c.1.23.45").unwrap());
    }

    #[test]
    fn scalar() {
        assert_eq!(DefaultChunkKeyEncoding::new_slash().encode(&[]).as_str(), "c");
        assert_eq!(DefaultChunkKeyEncoding::new_dot().encode(&[]).as_str(), "c");
    }
}
