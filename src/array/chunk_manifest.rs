//! Chunk manifests.
//!
//! A [`ChunkManifest`] maps chunk coordinates to [`VirtualChunkRef`]s: byte ranges inside foreign files which hold already-encoded chunks.
//! The referenced files are not owned or copied, and a virtual chunk is decoded with the codec chain of its array exactly like a chunk held in a store.
//!
//! The JSON layout of a manifest is an object keyed by chunk coordinates joined with `.` (`"0"` for a scalar array):
//! ```json
//! {
//!     "0.0": {"path": "/data/source.nc", "offset": 100, "length": 64},
//!     "0.1": {"path": "file:///data/source.nc", "offset": 164, "length": 64},
//!     "1.0": {"path": "relative/source.bin", "offset": 0, "length": 64}
//! }
//! ```
//!
//! Relative paths are resolved against the base directory of the manifest, if one is set.
//! A manifest is attached to an array with the `chunk-manifest-json` storage transformer or [`ArrayBuilder::chunk_manifest`](crate::array::ArrayBuilder::chunk_manifest), and makes the array read-only.

use std::{
    collections::BTreeMap,
    fs::File,
    path::{Path, PathBuf},
};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::byte_range::{extract_byte_ranges_read_seek, ByteRange};

use super::ArrayIndices;

/// A reference to an encoded chunk held in a foreign file.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub struct VirtualChunkRef {
    path: String,
    offset: u64,
    length: u64,
}

impl VirtualChunkRef {
    /// Create a new virtual chunk reference to `length` bytes at `offset` of the file at `path`.
    ///
    /// `path` is a filesystem path or a `file://` URL.
    #[must_use]
    pub fn new(path: impl Into<String>, offset: u64, length: u64) -> Self {
        Self {
            path: path.into(),
            offset,
            length,
        }
    }

    /// The path or URL of the referenced file.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The byte offset of the chunk in the referenced file.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// The byte length of the chunk.
    #[must_use]
    pub const fn length(&self) -> u64 {
        self.length
    }
}

/// A chunk manifest error.
#[derive(Debug, Error)]
pub enum ChunkManifestError {
    /// The manifest JSON is invalid.
    #[error("chunk manifest is invalid: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// A manifest key is not a valid chunk coordinate.
    #[error("chunk manifest key {0:?} is not a chunk coordinate")]
    InvalidKey(String),
    /// A chunk coordinate is outside of the chunk grid.
    #[error("chunk manifest coordinate {0:?} is outside of the chunk grid with shape {1:?}")]
    OutOfBounds(ArrayIndices, Vec<u64>),
    /// A path is not a valid filesystem path or `file://` URL.
    #[error("chunk manifest path {0} is invalid")]
    InvalidPath(String),
    /// A referenced file does not exist.
    #[error("the file {0} referenced by a chunk manifest is missing")]
    Missing(PathBuf),
    /// A referenced byte range extends past the end of its file.
    #[error("the byte range {offset}..{offset}+{length} of {path} referenced by a chunk manifest exceeds the file length {file_length}")]
    Truncated {
        /// The referenced file.
        path: PathBuf,
        /// The referenced offset.
        offset: u64,
        /// The referenced length.
        length: u64,
        /// The length of the file.
        file_length: u64,
    },
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

/// A chunk manifest.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct ChunkManifest {
    entries: BTreeMap<ArrayIndices, VirtualChunkRef>,
    base_directory: Option<PathBuf>,
}

fn parse_key(key: &str) -> Result<ArrayIndices, ChunkManifestError> {
    if key == "0" {
        // Either a scalar array or the first chunk of a 1D array, resolved by validate
        return Ok(vec![0]);
    }
    key.split('.')
        .map(|index| {
            index
                .parse::<u64>()
                .map_err(|_| ChunkManifestError::InvalidKey(key.to_string()))
        })
        .collect()
}

fn format_key(chunk_indices: &[u64]) -> String {
    itertools::join(chunk_indices, ".")
}

impl ChunkManifest {
    /// Create a new empty chunk manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a chunk manifest from its JSON representation.
    ///
    /// # Errors
    /// Returns [`ChunkManifestError`] if the JSON or a chunk coordinate is invalid.
    pub fn from_json(json: &[u8]) -> Result<Self, ChunkManifestError> {
        let entries: BTreeMap<String, VirtualChunkRef> = serde_json::from_slice(json)?;
        let entries = entries
            .into_iter()
            .map(|(key, chunk_ref)| Ok((parse_key(&key)?, chunk_ref)))
            .collect::<Result<_, ChunkManifestError>>()?;
        Ok(Self {
            entries,
            base_directory: None,
        })
    }

    /// Serialise the chunk manifest to its JSON representation.
    ///
    /// # Errors
    /// Returns a [`serde_json::Error`] if serialisation fails.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let entries: BTreeMap<String, &VirtualChunkRef> = self
            .entries
            .iter()
            .map(|(chunk_indices, chunk_ref)| (format_key(chunk_indices), chunk_ref))
            .collect();
        serde_json::to_vec_pretty(&entries)
    }

    /// Set the directory that relative paths are resolved against.
    #[must_use]
    pub fn with_base_directory(mut self, base_directory: impl Into<PathBuf>) -> Self {
        self.base_directory = Some(base_directory.into());
        self
    }

    /// Return the base directory, if set.
    #[must_use]
    pub fn base_directory(&self) -> Option<&Path> {
        self.base_directory.as_deref()
    }

    /// Add or replace the reference of the chunk at `chunk_indices`.
    pub fn insert(&mut self, chunk_indices: ArrayIndices, chunk_ref: VirtualChunkRef) {
        let chunk_indices = if chunk_indices.is_empty() {
            vec![0]
        } else {
            chunk_indices
        };
        self.entries.insert(chunk_indices, chunk_ref);
    }

    /// Return the reference of the chunk at `chunk_indices`, if any.
    #[must_use]
    pub fn get(&self, chunk_indices: &[u64]) -> Option<&VirtualChunkRef> {
        if chunk_indices.is_empty() {
            self.entries.get([0u64].as_slice())
        } else {
            self.entries.get(chunk_indices)
        }
    }

    /// Returns true if the manifest references the chunk at `chunk_indices`.
    #[must_use]
    pub fn contains(&self, chunk_indices: &[u64]) -> bool {
        self.get(chunk_indices).is_some()
    }

    /// Return the number of chunk references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the manifest has no chunk references.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return an iterator over the chunk coordinates and references of the manifest.
    pub fn iter(&self) -> impl Iterator<Item = (&ArrayIndices, &VirtualChunkRef)> {
        self.entries.iter()
    }

    /// Validate the manifest against a chunk grid with shape `grid_shape`.
    ///
    /// A scalar array has an empty grid shape and a single chunk with key `"0"`.
    ///
    /// # Errors
    /// Returns [`ChunkManifestError::OutOfBounds`] if a chunk coordinate has the wrong dimensionality or is outside the grid.
    pub fn validate(&self, grid_shape: &[u64]) -> Result<(), ChunkManifestError> {
        for chunk_indices in self.entries.keys() {
            let valid = if grid_shape.is_empty() {
                chunk_indices.as_slice() == [0]
            } else {
                chunk_indices.len() == grid_shape.len()
                    && std::iter::zip(chunk_indices, grid_shape).all(|(index, size)| index < size)
            };
            if !valid {
                return Err(ChunkManifestError::OutOfBounds(
                    chunk_indices.clone(),
                    grid_shape.to_vec(),
                ));
            }
        }
        Ok(())
    }

    /// Resolve the path of a chunk reference to a filesystem path.
    ///
    /// # Errors
    /// Returns [`ChunkManifestError::InvalidPath`] if the path is an invalid `file://` URL.
    pub fn resolve_path(&self, chunk_ref: &VirtualChunkRef) -> Result<PathBuf, ChunkManifestError> {
        let invalid = || ChunkManifestError::InvalidPath(chunk_ref.path.clone());
        if chunk_ref.path.starts_with("file://") {
            let url = url::Url::parse(&chunk_ref.path).map_err(|_| invalid())?;
            return url.to_file_path().map_err(|()| invalid());
        }
        let path = Path::new(&chunk_ref.path);
        match &self.base_directory {
            Some(base_directory) if path.is_relative() => Ok(base_directory.join(path)),
            _ => Ok(path.to_path_buf()),
        }
    }

    /// Read the encoded bytes of the chunk at `chunk_indices`.
    ///
    /// Returns [`None`] if the manifest does not reference the chunk.
    ///
    /// # Errors
    /// Returns [`ChunkManifestError`] if the referenced file is missing, shorter than the referenced byte range, or cannot be read.
    pub fn read_chunk(&self, chunk_indices: &[u64]) -> Result<Option<Bytes>, ChunkManifestError> {
        let Some(chunk_ref) = self.get(chunk_indices) else {
            return Ok(None);
        };
        let path = self.resolve_path(chunk_ref)?;
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ChunkManifestError::Missing(path));
            }
            Err(err) => return Err(err.into()),
        };
        let file_length = file.metadata()?.len();
        let byte_range = ByteRange::FromStart(chunk_ref.offset, Some(chunk_ref.length));
        if chunk_ref.offset.checked_add(chunk_ref.length).is_none()
            || !byte_range.is_valid(file_length)
        {
            return Err(ChunkManifestError::Truncated {
                path,
                offset: chunk_ref.offset,
                length: chunk_ref.length,
                file_length,
            });
        }
        let mut bytes = extract_byte_ranges_read_seek(&mut file, file_length, &[byte_range])?;
        Ok(bytes.pop().map(Bytes::from))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const JSON: &str = r#"{
        "0.0": {"path": "a.bin", "offset": 0, "length": 4},
        "0.1": {"path": "a.bin", "offset": 4, "length": 4},
        "1.0": {"path": "/absolute/b.bin", "offset": 8, "length": 2}
    }"#;

    #[test]
    fn chunk_manifest_json() {
        let manifest = ChunkManifest::from_json(JSON.as_bytes()).unwrap();
        assert_eq!(manifest.len(), 3);
        assert_eq!(
            manifest.get(&[1, 0]),
            Some(&VirtualChunkRef::new("/absolute/b.bin", 8, 2))
        );
        assert!(!manifest.contains(&[1, 1]));

        let round_trip = ChunkManifest::from_json(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(round_trip, manifest);

        assert!(ChunkManifest::from_json(br#"{"0.x": {"path": "a", "offset": 0, "length": 1}}"#).is_err());
        assert!(ChunkManifest::from_json(br#"{"0": {"path": "a", "offset": 0}}"#).is_err());
    }

    #[test]
    fn chunk_manifest_validate() {
        let manifest = ChunkManifest::from_json(JSON.as_bytes()).unwrap();
        assert!(manifest.validate(&[2, 2]).is_ok());
        assert!(matches!(
            manifest.validate(&[1, 2]),
            Err(ChunkManifestError::OutOfBounds(..))
        ));
        assert!(manifest.validate(&[2, 2, 2]).is_err());

        let mut scalar = ChunkManifest::new();
        scalar.insert(vec![], VirtualChunkRef::new("a.bin", 0, 1));
        assert!(scalar.contains(&[]));
        assert!(scalar.validate(&[]).is_ok());
        let json = String::from_utf8(scalar.to_json().unwrap()).unwrap();
        assert!(json.contains(r#""0": {"#));
    }

    #[test]
    fn chunk_manifest_resolve_path() {
        let manifest = ChunkManifest::new().with_base_directory("/base");
        assert_eq!(
            manifest
                .resolve_path(&VirtualChunkRef::new("dir/a.bin", 0, 1))
                .unwrap(),
            PathBuf::from("/base/dir/a.bin")
        );
        assert_eq!(
            manifest
                .resolve_path(&VirtualChunkRef::new("/abs/a.bin", 0, 1))
                .unwrap(),
            PathBuf::from("/abs/a.bin")
        );
        #[cfg(unix)]
        assert_eq!(
            manifest
                .resolve_path(&VirtualChunkRef::new("file:///abs/a%20b.bin", 0, 1))
                .unwrap(),
            PathBuf::from("/abs/a b.bin")
        );
    }

    #[test]
    fn chunk_manifest_read() {
        let directory = tempfile::tempdir().unwrap();
        let mut file = File::create(directory.path().join("source.bin")).unwrap();
        file.write_all(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
        drop(file);

        let mut manifest = ChunkManifest::new().with_base_directory(directory.path());
        manifest.insert(vec![0], VirtualChunkRef::new("source.bin", 2, 3));
        manifest.insert(vec![1], VirtualChunkRef::new("source.bin", 8, 4));
        manifest.insert(vec![2], VirtualChunkRef::new("missing.bin", 0, 1));

        assert_eq!(
            manifest.read_chunk(&[0]).unwrap(),
            Some(Bytes::from_static(&[2, 3, 4]))
        );
        assert!(matches!(
            manifest.read_chunk(&[1]),
            Err(ChunkManifestError::Truncated { file_length: 10, .. })
        ));
        assert!(matches!(
            manifest.read_chunk(&[2]),
            Err(ChunkManifestError::Missing(_))
        ));
        assert_eq!(manifest.read_chunk(&[3]).unwrap(), None);
    }
}
