use std::sync::Arc;

use crate::metadata::array_metadata_v3_to_v2;

use super::{
    chunk_key_encoding::{ChunkKeyEncoding, DefaultChunkKeyEncoding, V2ChunkKeyEncoding},
    codec::{
        ArrayToArrayCodecTraits, ArrayToBytesCodecTraits, BytesCodec, BytesToBytesCodecTraits,
        VlenV2Codec,
    },
    Array, ArrayCreateError, ArrayMetadata, ArrayMetadataV3, ArrayShape, ChunkManifest,
    ChunkShape, CodecChain, DataType, FillValue, RegularChunkGrid,
};

/// An [`Array`] builder.
///
/// The array builder is initialised from an array shape, data type, chunk shape, and fill value.
///  - The only codec enabled by default is `bytes` (with native endian encoding), or `vlen_v2` for the `string` data type, so the output is uncompressed.
///  - The default chunk key encoding is `default` with the `/` chunk key separator, or `v2` with the `.` separator for a Zarr V2 array.
///  - Attributes and dimension names are empty, and there is no chunk manifest.
///
/// Note that [`build`](ArrayBuilder::build) does not modify the store; the array metadata has to be explicitly written with [`Array::store_metadata`].
///
/// For example:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # use std::sync::Arc;
/// use zarrs_virtual::array::{ArrayBuilder, DataType, FillValue};
/// # let store = Arc::new(zarrs_virtual::storage::store::MemoryStore::new());
/// let array = ArrayBuilder::new(
///     vec![8, 8], // array shape
///     DataType::Float32,
///     vec![4, 4].try_into()?, // regular chunk shape (elements must be non-zero)
///     FillValue::from(f32::NAN),
/// )
/// .bytes_to_bytes_codecs(vec![
///     #[cfg(feature = "gzip")]
///     Box::new(zarrs_virtual::array::codec::GzipCodec::new(5)?),
/// ])
/// .dimension_names(Some(["y", "x"]))
/// .build(store.clone(), "/group/array")?;
/// array.store_metadata()?; // write metadata to the store
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ArrayBuilder {
    /// Array shape.
    pub shape: ArrayShape,
    /// Data type.
    pub data_type: DataType,
    /// Regular chunk shape.
    pub chunk_shape: ChunkShape,
    /// Chunk key encoding. If [`None`], the default for the Zarr version is used.
    pub chunk_key_encoding: Option<ChunkKeyEncoding>,
    /// Fill value.
    pub fill_value: FillValue,
    /// Array to array codecs.
    pub array_to_array_codecs: Vec<Box<dyn ArrayToArrayCodecTraits>>,
    /// Array to bytes codec.
    pub array_to_bytes_codec: Box<dyn ArrayToBytesCodecTraits>,
    /// Bytes to bytes codecs.
    pub bytes_to_bytes_codecs: Vec<Box<dyn BytesToBytesCodecTraits>>,
    /// Attributes.
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Dimension names.
    pub dimension_names: Option<Vec<Option<String>>>,
    /// Write Zarr V2 metadata.
    pub zarr_v2: bool,
    /// Chunk manifest.
    pub chunk_manifest: Option<ChunkManifest>,
}

impl ArrayBuilder {
    /// Create a new array builder.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        data_type: DataType,
        chunk_shape: ChunkShape,
        fill_value: FillValue,
    ) -> Self {
        let array_to_bytes_codec: Box<dyn ArrayToBytesCodecTraits> =
            if data_type.fixed_size().is_some() {
                Box::<BytesCodec>::default()
            } else {
                Box::<VlenV2Codec>::default()
            };
        Self {
            shape,
            data_type,
            chunk_shape,
            chunk_key_encoding: None,
            fill_value,
            array_to_array_codecs: Vec::default(),
            array_to_bytes_codec,
            bytes_to_bytes_codecs: Vec::default(),
            attributes: serde_json::Map::default(),
            dimension_names: None,
            zarr_v2: false,
            chunk_manifest: None,
        }
    }

    /// Set the shape.
    pub fn shape(&mut self, shape: ArrayShape) -> &mut Self {
        self.shape = shape;
        self
    }

    /// Set the chunk key encoding.
    pub fn chunk_key_encoding(&mut self, chunk_key_encoding: ChunkKeyEncoding) -> &mut Self {
        self.chunk_key_encoding = Some(chunk_key_encoding);
        self
    }

    /// Set the array to array codecs.
    ///
    /// If left unmodified, the array will have no array to array codecs.
    pub fn array_to_array_codecs(
        &mut self,
        array_to_array_codecs: Vec<Box<dyn ArrayToArrayCodecTraits>>,
    ) -> &mut Self {
        self.array_to_array_codecs = array_to_array_codecs;
        self
    }

    /// Set the array to bytes codec.
    pub fn array_to_bytes_codec(
        &mut self,
        array_to_bytes_codec: Box<dyn ArrayToBytesCodecTraits>,
    ) -> &mut Self {
        self.array_to_bytes_codec = array_to_bytes_codec;
        self
    }

    /// Set the bytes to bytes codecs.
    ///
    /// If left unmodified, the array will have no bytes to bytes codecs (i.e. no compression).
    pub fn bytes_to_bytes_codecs(
        &mut self,
        bytes_to_bytes_codecs: Vec<Box<dyn BytesToBytesCodecTraits>>,
    ) -> &mut Self {
        self.bytes_to_bytes_codecs = bytes_to_bytes_codecs;
        self
    }

    /// Set the user defined attributes.
    pub fn attributes(
        &mut self,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> &mut Self {
        self.attributes = attributes;
        self
    }

    /// Set the dimension names.
    ///
    /// If left unmodified, all dimension names are "unnamed".
    pub fn dimension_names<I, D>(&mut self, dimension_names: Option<I>) -> &mut Self
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        self.dimension_names = dimension_names.map(|dimension_names| {
            dimension_names
                .into_iter()
                .map(|dimension_name| Some(dimension_name.into()))
                .collect()
        });
        self
    }

    /// Write Zarr V2 metadata (`.zarray` and `.zattrs`) instead of Zarr V3 metadata (`zarr.json`).
    ///
    /// The codecs must have a Zarr V2 equivalent, see [`array_metadata_v3_to_v2`].
    pub fn zarr_v2(&mut self, zarr_v2: bool) -> &mut Self {
        self.zarr_v2 = zarr_v2;
        self
    }

    /// Back the array with a chunk manifest. The array will be read only.
    pub fn chunk_manifest(&mut self, chunk_manifest: ChunkManifest) -> &mut Self {
        self.chunk_manifest = Some(chunk_manifest);
        self
    }

    /// Build the array metadata.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if the fill value is incompatible with the data type or the metadata cannot be represented as Zarr V2 metadata.
    pub fn build_metadata(&self) -> Result<ArrayMetadata, ArrayCreateError> {
        let chunk_key_encoding = self.chunk_key_encoding.clone().unwrap_or_else(|| {
            if self.zarr_v2 {
                ChunkKeyEncoding::new(V2ChunkKeyEncoding::default())
            } else {
                ChunkKeyEncoding::new(DefaultChunkKeyEncoding::default())
            }
        });
        let codec_chain = CodecChain::new(
            self.array_to_array_codecs.clone(),
            self.array_to_bytes_codec.clone(),
            self.bytes_to_bytes_codecs.clone(),
        );
        let metadata = ArrayMetadataV3::new(
            self.shape.clone(),
            self.data_type.metadata(),
            RegularChunkGrid::new(self.chunk_shape.clone()).metadata(),
            chunk_key_encoding.create_metadata(),
            self.data_type.metadata_fill_value(&self.fill_value)?,
            codec_chain.create_metadatas(),
        )
        .with_attributes(self.attributes.clone())
        .with_dimension_names(self.dimension_names.clone());

        if self.zarr_v2 {
            Ok(ArrayMetadata::V2(array_metadata_v3_to_v2(&metadata)?))
        } else {
            Ok(ArrayMetadata::V3(metadata))
        }
    }

    /// Build into an [`Array`].
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if there is an error creating the array.
    /// This can be due to an invalid path, or a problem with the array configuration or chunk manifest.
    pub fn build<TStorage: ?Sized>(
        &self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<Array<TStorage>, ArrayCreateError> {
        let array = Array::new_with_metadata(storage, path, self.build_metadata()?)?;
        if let Some(chunk_manifest) = &self.chunk_manifest {
            array.with_chunk_manifest(chunk_manifest.clone())
        } else {
            Ok(array)
        }
    }

    /// Build into an [`Arc<Array>`].
    ///
    /// # Errors
    /// See [`build`](ArrayBuilder::build).
    pub fn build_arc<TStorage: ?Sized>(
        &self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<Arc<Array<TStorage>>, ArrayCreateError> {
        Ok(Arc::new(self.build(storage, path)?))
    }
}
