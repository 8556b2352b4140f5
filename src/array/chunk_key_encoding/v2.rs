use crate::{
    metadata::v3::{
        chunk_key_encoding::v2::{V2ChunkKeyEncodingConfiguration, IDENTIFIER},
        MetadataConfiguration, MetadataV3,
    },
    plugin::{PluginCreateError, PluginMetadataInvalidError},
    storage::StoreKey,
};

use super::{join_indices, ChunkKeyEncodingTraits, ChunkKeySeparator};

/// A `v2` chunk key encoding.
///
/// The key for a chunk with at least one dimension is the ASCII decimal chunk indices joined by the separator.
/// The key of the chunk of a scalar array is `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct V2ChunkKeyEncoding {
    separator: ChunkKeySeparator,
}

impl V2ChunkKeyEncoding {
    /// Create a new `v2` chunk key encoding with separator `separator`.
    #[must_use]
    pub const fn new(separator: ChunkKeySeparator) -> Self {
        Self { separator }
    }

    /// Create a new `v2` chunk key encoding with separator `.`.
    #[must_use]
    pub const fn new_dot() -> Self {
        Self::new(ChunkKeySeparator::Dot)
    }

    /// Create a new `v2` chunk key encoding with separator `/`.
    #[must_use]
    pub const fn new_slash() -> Self {
        Self::new(ChunkKeySeparator::Slash)
    }

    /// Return the separator.
    #[must_use]
    pub const fn separator(&self) -> ChunkKeySeparator {
        self.separator
    }

    pub(super) fn from_metadata(metadata: &MetadataV3) -> Result<Self, PluginCreateError> {
        let configuration: V2ChunkKeyEncodingConfiguration =
            metadata.to_configuration().map_err(|_| {
                PluginMetadataInvalidError::new(IDENTIFIER, "chunk key encoding", metadata.clone())
            })?;
        Ok(Self::new(configuration.separator))
    }
}

impl Default for V2ChunkKeyEncoding {
    /// Create a `v2` chunk key encoding with default separator: `.`.
    fn default() -> Self {
        Self::new_dot()
    }
}

impl ChunkKeyEncodingTraits for V2ChunkKeyEncoding {
    fn create_metadata(&self) -> MetadataV3 {
        let mut configuration = MetadataConfiguration::new();
        configuration.insert("separator".to_string(), self.separator.to_string().into());
        MetadataV3::new_with_configuration(IDENTIFIER, configuration)
    }

    fn encode(&self, chunk_grid_indices: &[u64]) -> StoreKey {
        if chunk_grid_indices.is_empty() {
            StoreKey::new_unchecked("0")
        } else {
            StoreKey::new_unchecked(join_indices(chunk_grid_indices, self.separator))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_nd() {
        let key = V2ChunkKeyEncoding::new_slash().encode(&[1, 23, 45]);
        assert_eq!(key, StoreKey::new("1/23/45").unwrap());
    }

    #[test]
    fn dot_nd() {
        let key = V2ChunkKeyEncoding::new_dot().encode(&[1, 23, 45]);
        assert_eq!(key, StoreKey::new("1.23.45").unwrap());
    }

    #[test]
    fn scalar() {
        assert_eq!(V2ChunkKeyEncoding::new_slash().encode(&[]).as_str(), "0");
        assert_eq!(V2ChunkKeyEncoding::default().encode(&[]).as_str(), "0");
    }
}
