//! Tests which mutate the global configuration, kept in a single test so they cannot race.

use std::sync::Arc;

use zarrs_virtual::{
    array::{Array, ArrayCreateError, ArrayError, ArrayMetadata, FillValue},
    array_subset::ArraySubset,
    config::{global_config, global_config_mut},
    storage::{store::MemoryStore, ReadableStorageTraits, StoreKey, WritableStorageTraits},
};

const STRING_NUMERIC_FILL: &str = r#"{
    "zarr_format": 2,
    "shape": [4],
    "chunks": [2],
    "dtype": "|O",
    "compressor": null,
    "fill_value": 0,
    "order": "C",
    "filters": [{"id": "vlen-utf8"}]
}"#;

fn numeric_string_fill_value() {
    let metadata: ArrayMetadata = serde_json::from_str(STRING_NUMERIC_FILL).unwrap();
    assert!(matches!(
        Array::new_with_metadata(Arc::new(MemoryStore::new()), "/", metadata.clone()),
        Err(ArrayCreateError::InvalidFillValueMetadata(_))
    ));

    global_config_mut().set_coerce_numeric_string_fill_value(true);
    let array = Array::new_with_metadata(Arc::new(MemoryStore::new()), "/", metadata);
    global_config_mut().set_coerce_numeric_string_fill_value(false);

    let array = array.unwrap();
    assert_eq!(array.fill_value(), &FillValue::from("0"));
    assert_eq!(
        array
            .retrieve_array_subset_elements::<String>(&ArraySubset::new_with_shape(vec![4]))
            .unwrap(),
        vec!["0"; 4]
    );
}

#[cfg(feature = "crc32c")]
fn validate_checksums() {
    let store = Arc::new(MemoryStore::new());
    let metadata: ArrayMetadata = serde_json::from_str(
        r#"{
            "zarr_format": 3,
            "node_type": "array",
            "shape": [4],
            "data_type": "uint8",
            "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": [4]}},
            "chunk_key_encoding": {"name": "default"},
            "fill_value": 0,
            "codecs": [{"name": "bytes"}, {"name": "crc32c"}]
        }"#,
    )
    .unwrap();
    let array = Array::new_with_metadata(store.clone(), "/", metadata).unwrap();
    array.store_chunk_elements::<u8>(&[0], &[1, 2, 3, 4]).unwrap();

    let key = StoreKey::new("c/0").unwrap();
    let mut encoded = store.get(&key).unwrap().unwrap().to_vec();
    encoded[4] ^= 0xff;
    store.set(&key, encoded.into()).unwrap();
    assert!(matches!(
        array.retrieve_chunk(&[0]),
        Err(ArrayError::ChunkError { .. })
    ));

    global_config_mut().set_validate_checksums(false);
    let elements = array.retrieve_chunk_elements::<u8>(&[0]);
    global_config_mut().set_validate_checksums(true);
    assert_eq!(elements.unwrap(), vec![1, 2, 3, 4]);
}

fn chunk_concurrent_limit() {
    let limit = global_config().chunk_concurrent_limit();
    assert!(limit > 0);
    let metadata: ArrayMetadata = serde_json::from_str(
        r#"{
            "zarr_format": 3,
            "node_type": "array",
            "shape": [8],
            "data_type": "uint8",
            "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": [3]}},
            "chunk_key_encoding": {"name": "default"},
            "fill_value": 0,
            "codecs": [{"name": "bytes"}]
        }"#,
    )
    .unwrap();
    let array = Array::new_with_metadata(Arc::new(MemoryStore::new()), "/", metadata).unwrap();
    let subset = ArraySubset::new_with_shape(vec![8]);
    let elements: Vec<u8> = (1..=8).collect();

    global_config_mut().set_chunk_concurrent_limit(1);
    assert_eq!(global_config().chunk_concurrent_limit(), 1);
    let stored = array.store_array_subset_elements(&subset, &elements);
    let retrieved = array.retrieve_array_subset_elements::<u8>(&subset);
    global_config_mut().set_chunk_concurrent_limit(limit);

    stored.unwrap();
    assert_eq!(retrieved.unwrap(), elements);
}

#[test]
fn global_config_options() {
    numeric_string_fill_value();
    chunk_concurrent_limit();
    #[cfg(feature = "crc32c")]
    validate_checksums();
}
