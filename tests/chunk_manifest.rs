#![cfg(feature = "gzip")]

use std::{path::Path, sync::Arc};

use zarrs_virtual::{
    array::{
        codec::GzipCodec, Array, ArrayBuilder, ArrayCreateError, ArrayError, ChunkManifest,
        ChunkManifestError, DataType, FillValue, VirtualChunkRef,
    },
    array_subset::ArraySubset,
    storage::{store::MemoryStore, ReadableStorageTraits, StoreKey, WritableStorageTraits},
};

fn builder() -> ArrayBuilder {
    let mut builder = ArrayBuilder::new(
        vec![6],
        DataType::Int32,
        vec![2].try_into().unwrap(),
        FillValue::from(-1i32),
    );
    builder.bytes_to_bytes_codecs(vec![Box::new(GzipCodec::new(5).unwrap())]);
    builder
}

/// Write chunks 0 and 1 natively, then copy their encoded bytes into a foreign file after a header.
/// Returns the native array and a manifest referencing the foreign file.
fn native_and_manifest(dir: &Path) -> (Array<MemoryStore>, ChunkManifest) {
    let store = Arc::new(MemoryStore::new());
    let array = builder().build(store.clone(), "/native").unwrap();
    array
        .store_array_subset_elements::<i32>(&ArraySubset::new_with_ranges(&[0..4]), &[10, 11, 12, 13])
        .unwrap();

    let chunk0 = store.get(&StoreKey::new("native/c/0").unwrap()).unwrap().unwrap();
    let chunk1 = store.get(&StoreKey::new("native/c/1").unwrap()).unwrap().unwrap();
    let header = b"FOREIGN HEADER";
    let file_path = dir.join("data.bin");
    std::fs::write(&file_path, [header.as_slice(), &chunk0, &chunk1].concat()).unwrap();

    let offset0 = header.len() as u64;
    let offset1 = offset0 + chunk0.len() as u64;
    let mut manifest = ChunkManifest::new();
    manifest.insert(
        vec![0],
        VirtualChunkRef::new(file_path.to_str().unwrap(), offset0, chunk0.len() as u64),
    );
    manifest.insert(
        vec![1],
        VirtualChunkRef::new(
            format!("file://{}", file_path.display()),
            offset1,
            chunk1.len() as u64,
        ),
    );
    (array, manifest)
}

#[test]
fn chunk_manifest_virtual_matches_native() {
    let dir = tempfile::tempdir().unwrap();
    let (native, manifest) = native_and_manifest(dir.path());

    let mut builder = builder();
    builder.chunk_manifest(manifest);
    let virtual_array = builder
        .build(Arc::new(MemoryStore::new()), "/virtual")
        .unwrap();
    assert!(virtual_array.is_read_only());

    let subset = ArraySubset::new_with_shape(vec![6]);
    assert_eq!(
        virtual_array.retrieve_array_subset_elements::<i32>(&subset).unwrap(),
        native.retrieve_array_subset_elements::<i32>(&subset).unwrap()
    );
    assert_eq!(
        virtual_array.retrieve_array_subset_elements::<i32>(&subset).unwrap(),
        vec![10, 11, 12, 13, -1, -1]
    );
    assert!(matches!(
        virtual_array.store_chunk_elements::<i32>(&[2], &[1, 2]),
        Err(ArrayError::ReadOnlyChunk(_))
    ));
}

#[test]
fn chunk_manifest_open_from_store() {
    let dir = tempfile::tempdir().unwrap();
    let (_, manifest) = native_and_manifest(dir.path());

    let store = Arc::new(MemoryStore::new());
    let mut builder = builder();
    builder.chunk_manifest(manifest.clone());
    builder.build(store.clone(), "/virtual").unwrap().store_metadata().unwrap();

    let zarr_json: serde_json::Value = serde_json::from_slice(
        &store
            .get(&StoreKey::new("virtual/zarr.json").unwrap())
            .unwrap()
            .unwrap(),
    )
    .unwrap();
    assert_eq!(
        zarr_json["storage_transformers"],
        serde_json::json!([{"name": "chunk-manifest-json", "configuration": {"manifest": "manifest.json"}}])
    );
    let manifest_json = store
        .get(&StoreKey::new("virtual/manifest.json").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(ChunkManifest::from_json(&manifest_json).unwrap(), manifest);

    let array = Array::open(store, "/virtual").unwrap();
    assert!(array.is_read_only());
    assert_eq!(array.chunk_manifest(), Some(&manifest));
    assert_eq!(
        array.retrieve_chunk_elements::<i32>(&[1]).unwrap(),
        vec![12, 13]
    );
}

#[test]
fn chunk_manifest_missing_manifest_document() {
    let store = Arc::new(MemoryStore::new());
    let mut builder = builder();
    builder.chunk_manifest(ChunkManifest::new());
    let array = builder.build(store.clone(), "/virtual").unwrap();
    array.store_metadata().unwrap();
    store.erase(&StoreKey::new("virtual/manifest.json").unwrap()).unwrap();
    assert!(matches!(
        Array::open(store, "/virtual"),
        Err(ArrayCreateError::MissingMetadata)
    ));
}

#[test]
fn chunk_manifest_falls_back_to_store() {
    let dir = tempfile::tempdir().unwrap();
    let (_, manifest) = native_and_manifest(dir.path());

    let store = Arc::new(MemoryStore::new());
    let native = builder().build(store.clone(), "/array").unwrap();
    native.store_chunk_elements::<i32>(&[2], &[20, 21]).unwrap();

    let virtual_array = builder()
        .build(store, "/array")
        .unwrap()
        .with_chunk_manifest(manifest)
        .unwrap();
    assert_eq!(
        virtual_array
            .retrieve_array_subset_elements::<i32>(&ArraySubset::new_with_ranges(&[1..6]))
            .unwrap(),
        vec![11, 12, 13, 20, 21]
    );
}

#[test]
fn chunk_manifest_relative_paths() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("raw.bin"), [0u8, 1, 2, 3, 4, 5, 6, 7]).unwrap();
    let mut manifest = ChunkManifest::new();
    manifest.insert(vec![1], VirtualChunkRef::new("raw.bin", 2, 4));
    let manifest = manifest.with_base_directory(dir.path());

    let array = ArrayBuilder::new(
        vec![8],
        DataType::UInt8,
        vec![4].try_into().unwrap(),
        FillValue::from(0u8),
    )
    .build(Arc::new(MemoryStore::new()), "/")
    .unwrap()
    .with_chunk_manifest(manifest)
    .unwrap();
    assert_eq!(
        array
            .retrieve_array_subset_elements::<u8>(&ArraySubset::new_with_shape(vec![8]))
            .unwrap(),
        vec![0, 0, 0, 0, 2, 3, 4, 5]
    );
}

#[test]
fn chunk_manifest_relative_paths_reopen() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("raw.bin"), [0u8, 1, 2, 3, 4, 5, 6, 7]).unwrap();
    let mut manifest = ChunkManifest::new();
    manifest.insert(vec![1], VirtualChunkRef::new("raw.bin", 2, 4));
    let manifest = manifest.with_base_directory(dir.path());

    let store = Arc::new(MemoryStore::new());
    let mut builder = ArrayBuilder::new(
        vec![8],
        DataType::UInt8,
        vec![4].try_into().unwrap(),
        FillValue::from(0u8),
    );
    builder.chunk_manifest(manifest);
    builder.build(store.clone(), "/relative").unwrap().store_metadata().unwrap();

    let zarr_json: serde_json::Value = serde_json::from_slice(
        &store
            .get(&StoreKey::new("relative/zarr.json").unwrap())
            .unwrap()
            .unwrap(),
    )
    .unwrap();
    assert_eq!(
        zarr_json["storage_transformers"][0]["configuration"]["base_directory"],
        serde_json::json!(dir.path().to_str().unwrap())
    );

    let array = Array::open(store, "/relative").unwrap();
    assert_eq!(
        array.chunk_manifest().and_then(ChunkManifest::base_directory),
        Some(dir.path())
    );
    assert_eq!(
        array
            .retrieve_array_subset_elements::<u8>(&ArraySubset::new_with_shape(vec![8]))
            .unwrap(),
        vec![0, 0, 0, 0, 2, 3, 4, 5]
    );
}

#[test]
fn chunk_manifest_missing_and_truncated_files() {
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("short.bin");
    std::fs::write(&file_path, [1u8, 2, 3]).unwrap();

    let mut manifest = ChunkManifest::new();
    manifest.insert(
        vec![0],
        VirtualChunkRef::new(dir.path().join("moved.bin").to_str().unwrap(), 0, 2),
    );
    manifest.insert(vec![1], VirtualChunkRef::new(file_path.to_str().unwrap(), 2, 2));
    let array = ArrayBuilder::new(
        vec![4],
        DataType::UInt8,
        vec![2].try_into().unwrap(),
        FillValue::from(0u8),
    )
    .build(Arc::new(MemoryStore::new()), "/")
    .unwrap()
    .with_chunk_manifest(manifest)
    .unwrap();

    match array.retrieve_chunk(&[0]) {
        Err(ArrayError::ChunkError {
            chunk_indices,
            source,
        }) => {
            assert_eq!(chunk_indices, vec![0]);
            assert!(matches!(
                *source,
                ArrayError::ChunkManifestError(ChunkManifestError::Missing(_))
            ));
        }
        _ => panic!("expected a missing file error"),
    }
    match array.retrieve_array_subset(&ArraySubset::new_with_ranges(&[2..4])) {
        Err(ArrayError::ChunkError {
            chunk_indices,
            source,
        }) => {
            assert_eq!(chunk_indices, vec![1]);
            assert!(matches!(
                *source,
                ArrayError::ChunkManifestError(ChunkManifestError::Truncated {
                    offset: 2,
                    length: 2,
                    file_length: 3,
                    ..
                })
            ));
        }
        _ => panic!("expected a truncated file error"),
    }
}

#[test]
fn chunk_manifest_invalid() {
    assert!(matches!(
        ChunkManifest::from_json(br#"{"0.x": {"path": "a.bin", "offset": 0, "length": 1}}"#),
        Err(ChunkManifestError::InvalidKey(_))
    ));
    assert!(matches!(
        ChunkManifest::from_json(br#"{"0": {"path": "a.bin", "offset": -1, "length": 1}}"#),
        Err(ChunkManifestError::InvalidJson(_))
    ));

    let manifest = ChunkManifest::from_json(
        br#"{"0.3": {"path": "/data/a.bin", "offset": 0, "length": 4}}"#,
    )
    .unwrap();
    let array = ArrayBuilder::new(
        vec![4, 4],
        DataType::UInt8,
        vec![2, 2].try_into().unwrap(),
        FillValue::from(0u8),
    )
    .build(Arc::new(MemoryStore::new()), "/")
    .unwrap();
    assert!(matches!(
        array.with_chunk_manifest(manifest),
        Err(ArrayCreateError::ChunkManifestError(
            ChunkManifestError::OutOfBounds(..)
        ))
    ));
}

#[test]
fn chunk_manifest_scalar_array() {
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("scalar.bin");
    std::fs::write(&file_path, 42u16.to_le_bytes()).unwrap();
    let manifest = ChunkManifest::from_json(
        serde_json::json!({"0": {"path": file_path.to_str().unwrap(), "offset": 0, "length": 2}})
            .to_string()
            .as_bytes(),
    )
    .unwrap();

    let mut builder = ArrayBuilder::new(
        vec![],
        DataType::UInt16,
        Vec::<u64>::new().try_into().unwrap(),
        FillValue::from(0u16),
    );
    builder.array_to_bytes_codec(Box::new(zarrs_virtual::array::codec::BytesCodec::little()));
    builder.chunk_manifest(manifest);
    let array = builder.build(Arc::new(MemoryStore::new()), "/").unwrap();
    assert_eq!(array.retrieve_chunk_elements::<u16>(&[]).unwrap(), vec![42]);
}
