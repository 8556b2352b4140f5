use std::sync::Arc;

use zarrs_virtual::{
    array::{Array, ArrayCreateError, ArrayMetadata},
    storage::{store::MemoryStore, StorageError, StoreKey, WritableStorageTraits},
};

const VALID: &str = r#"{
    "zarr_format": 3,
    "node_type": "array",
    "shape": [10, 10],
    "data_type": "int32",
    "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": [5, 5]}},
    "chunk_key_encoding": {"name": "default"},
    "fill_value": 0,
    "codecs": [{"name": "bytes", "configuration": {"endian": "little"}}],
    "dimension_names": ["y", "x"]
}"#;

fn create(json: &str) -> Result<Array<MemoryStore>, ArrayCreateError> {
    let metadata: ArrayMetadata = serde_json::from_str(json).unwrap();
    Array::new_with_metadata(Arc::new(MemoryStore::new()), "/", metadata)
}

#[test]
fn invalid_metadata_rejected() {
    assert!(create(VALID).is_ok());
    assert!(matches!(
        create(&VALID.replace("[5, 5]", "[5, 5, 5]")),
        Err(ArrayCreateError::InvalidChunkGridDimensionality(3, 2))
    ));
    assert!(matches!(
        create(&VALID.replace(r#"["y", "x"]"#, r#"["x"]"#)),
        Err(ArrayCreateError::InvalidDimensionNames(1, 2))
    ));
    assert!(matches!(
        create(&VALID.replace(r#""int32""#, r#""complex_thing""#)),
        Err(ArrayCreateError::DataTypeCreateError(_))
    ));
    assert!(matches!(
        create(&VALID.replace(r#""default""#, r#""hilbert""#)),
        Err(ArrayCreateError::ChunkKeyEncodingCreateError(_))
    ));
    assert!(matches!(
        create(&VALID.replace(r#""regular""#, r#""irregular""#)),
        Err(ArrayCreateError::ChunkGridCreateError(_))
    ));
    assert!(matches!(
        create(&VALID.replace(r#""fill_value": 0"#, r#""fill_value": "abc""#)),
        Err(ArrayCreateError::InvalidFillValueMetadata(_))
    ));
    assert!(matches!(
        create(&VALID.replace(r#""codecs": [{"name": "bytes", "configuration": {"endian": "little"}}]"#, r#""codecs": []"#)),
        Err(ArrayCreateError::CodecsCreateError(_))
    ));
}

#[test]
fn invalid_metadata_bytes_endian_missing() {
    assert!(matches!(
        create(&VALID.replace(r#"{"name": "bytes", "configuration": {"endian": "little"}}"#, r#"{"name":"bytes"}"#)),
        Err(ArrayCreateError::InvalidMetadata(_))
    ));
    assert!(create(
        &VALID
            .replace(r#"{"name": "bytes", "configuration": {"endian": "little"}}"#, r#"{"name":"bytes"}"#)
            .replace(r#""int32""#, r#""uint8""#)
    )
    .is_ok());
}

#[test]
fn invalid_metadata_document() {
    assert!(serde_json::from_str::<ArrayMetadata>(&VALID.replace("\"zarr_format\": 3", "\"zarr_format\": 4")).is_err());
    assert!(serde_json::from_str::<ArrayMetadata>(&VALID.replace("\"shape\": [10, 10],", "")).is_err());

    let store = Arc::new(MemoryStore::new());
    store
        .set(&StoreKey::new("array/zarr.json").unwrap(), VALID.replace("\"shape\"", "\"shap\"").into())
        .unwrap();
    assert!(matches!(
        Array::open(store.clone(), "/array"),
        Err(ArrayCreateError::StorageError(StorageError::InvalidMetadata(..)))
    ));
    assert!(matches!(
        Array::open(store, "/other"),
        Err(ArrayCreateError::MissingMetadata)
    ));
}
