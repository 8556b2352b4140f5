use std::sync::Arc;

use zarrs_virtual::{
    array::{Array, ArrayBuilder, ArrayMetadata, DataType, FillValue},
    array_subset::ArraySubset,
    storage::{store::MemoryStore, ReadableStorageTraits, StoreKey},
};

fn array_from_json(store: &Arc<MemoryStore>, path: &str, json: &str) -> Array<MemoryStore> {
    let metadata: ArrayMetadata = serde_json::from_str(json).unwrap();
    let array = Array::new_with_metadata(store.clone(), path, metadata).unwrap();
    array.store_metadata().unwrap();
    array
}

fn stored(store: &MemoryStore, key: &str) -> Vec<u8> {
    store
        .get(&StoreKey::new(key).unwrap())
        .unwrap()
        .unwrap()
        .to_vec()
}

#[test]
fn array_dialects_int32_gzip_chunk_bytes_identical() {
    let store = Arc::new(MemoryStore::new());
    let array_v3 = array_from_json(
        &store,
        "/v3",
        r#"{
            "zarr_format": 3,
            "node_type": "array",
            "shape": [4, 4],
            "data_type": "int32",
            "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": [2, 3]}},
            "chunk_key_encoding": {"name": "default", "configuration": {"separator": "/"}},
            "fill_value": 7,
            "codecs": [
                {"name": "bytes", "configuration": {"endian": "little"}},
                {"name": "gzip", "configuration": {"level": 5}}
            ]
        }"#,
    );
    let array_v2 = array_from_json(
        &store,
        "/v2",
        r#"{
            "zarr_format": 2,
            "shape": [4, 4],
            "chunks": [2, 3],
            "dtype": "<i4",
            "compressor": {"id": "gzip", "level": 5},
            "fill_value": 7,
            "order": "C",
            "filters": null
        }"#,
    );

    let elements = (0..16).collect::<Vec<i32>>();
    let subset = ArraySubset::new_with_shape(vec![4, 4]);
    array_v3.store_array_subset_elements(&subset, &elements).unwrap();
    array_v2.store_array_subset_elements(&subset, &elements).unwrap();

    for (v3_key, v2_key) in [
        ("v3/c/0/0", "v2/0.0"),
        ("v3/c/0/1", "v2/0.1"),
        ("v3/c/1/0", "v2/1.0"),
        ("v3/c/1/1", "v2/1.1"),
    ] {
        assert_eq!(stored(&store, v3_key), stored(&store, v2_key), "{v3_key}");
    }
    assert_eq!(
        array_v2.retrieve_array_subset_elements::<i32>(&subset).unwrap(),
        elements
    );
    assert_eq!(
        array_v2
            .retrieve_chunk_elements::<i32>(&[1, 1])
            .unwrap(),
        vec![11, 7, 7, 15, 7, 7]
    );
}

#[test]
fn array_dialects_string_chunk_bytes_identical() {
    let store = Arc::new(MemoryStore::new());
    let array_v3 = array_from_json(
        &store,
        "/v3",
        r#"{
            "zarr_format": 3,
            "node_type": "array",
            "shape": [5],
            "data_type": "string",
            "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": [2]}},
            "chunk_key_encoding": {"name": "v2", "configuration": {"separator": "."}},
            "fill_value": "",
            "codecs": [{"name": "vlen_v2"}]
        }"#,
    );
    let array_v2 = array_from_json(
        &store,
        "/v2",
        r#"{
            "zarr_format": 2,
            "shape": [5],
            "chunks": [2],
            "dtype": "|O",
            "compressor": null,
            "fill_value": null,
            "order": "C",
            "filters": [{"id": "vlen-utf8"}]
        }"#,
    );

    let subset = ArraySubset::new_with_ranges(&[0..3]);
    for array in [&array_v3, &array_v2] {
        array
            .store_array_subset_elements(&subset, &["a", "bb", ""])
            .unwrap();
        assert_eq!(
            array
                .retrieve_array_subset_elements::<String>(&ArraySubset::new_with_shape(vec![5]))
                .unwrap(),
            vec!["a", "bb", "", "", ""]
        );
    }
    assert_eq!(stored(&store, "v3/0"), stored(&store, "v2/0"));
    assert_eq!(
        stored(&store, "v2/0"),
        [2u32.to_le_bytes().as_slice(), &1u32.to_le_bytes(), b"a", &2u32.to_le_bytes(), b"bb"].concat()
    );
    // The second chunk holds "" and the fill value, so it is not stored
    assert!(store.get(&StoreKey::new("v2/1").unwrap()).unwrap().is_none());
}

#[test]
fn array_dialects_fortran_order_matches_transpose() {
    let store = Arc::new(MemoryStore::new());
    let array_v3 = array_from_json(
        &store,
        "/v3",
        r#"{
            "zarr_format": 3,
            "node_type": "array",
            "shape": [2, 3],
            "data_type": "float64",
            "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": [2, 3]}},
            "chunk_key_encoding": {"name": "v2", "configuration": {"separator": "."}},
            "fill_value": "NaN",
            "codecs": [
                {"name": "transpose", "configuration": {"order": [1, 0]}},
                {"name": "bytes", "configuration": {"endian": "big"}}
            ]
        }"#,
    );
    let array_v2 = array_from_json(
        &store,
        "/v2",
        r#"{
            "zarr_format": 2,
            "shape": [2, 3],
            "chunks": [2, 3],
            "dtype": ">f8",
            "compressor": null,
            "fill_value": "NaN",
            "order": "F",
            "filters": null
        }"#,
    );
    let elements = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    array_v3.store_chunk_elements::<f64>(&[0, 0], &elements).unwrap();
    array_v2.store_chunk_elements::<f64>(&[0, 0], &elements).unwrap();
    assert_eq!(stored(&store, "v3/0.0"), stored(&store, "v2/0.0"));
    assert_eq!(
        stored(&store, "v2/0.0"),
        [0.0f64, 3.0, 1.0, 4.0, 2.0, 5.0]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect::<Vec<u8>>()
    );
}

#[test]
fn array_dialects_v2_metadata_round_trip() {
    let store = Arc::new(MemoryStore::new());
    let mut attributes = serde_json::Map::new();
    attributes.insert("units".to_string(), "m".into());
    let mut builder = ArrayBuilder::new(
        vec![6],
        DataType::UInt16,
        vec![4].try_into().unwrap(),
        FillValue::from(3u16),
    );
    builder
        .zarr_v2(true)
        .attributes(attributes.clone())
        .dimension_names(Some(["x"]));
    let array = builder.build(store.clone(), "/group/array").unwrap();
    array.store_metadata().unwrap();
    array
        .store_array_subset_elements::<u16>(&ArraySubset::new_with_ranges(&[2..6]), &[1, 2, 3, 4])
        .unwrap();

    assert!(store
        .get(&StoreKey::new("group/array/zarr.json").unwrap())
        .unwrap()
        .is_none());
    let zarray: serde_json::Value =
        serde_json::from_slice(&stored(&store, "group/array/.zarray")).unwrap();
    assert_eq!(zarray["zarr_format"], 2);
    assert_eq!(zarray["fill_value"], 3);
    assert_eq!(zarray["chunks"], serde_json::json!([4]));
    let zattrs: serde_json::Value =
        serde_json::from_slice(&stored(&store, "group/array/.zattrs")).unwrap();
    assert_eq!(zattrs["units"], "m");
    assert_eq!(zattrs["_ARRAY_DIMENSIONS"], serde_json::json!(["x"]));

    let array = Array::open(store.clone(), "/group/array").unwrap();
    assert!(matches!(array.metadata(), ArrayMetadata::V2(_)));
    assert_eq!(array.attributes()["units"], "m");
    assert_eq!(array.dimension_names(), Some([Some("x".to_string())].as_slice()));
    assert_eq!(
        array
            .retrieve_array_subset_elements::<u16>(&ArraySubset::new_with_shape(vec![6]))
            .unwrap(),
        vec![3, 3, 1, 2, 3, 4]
    );
    assert!(store
        .get(&StoreKey::new("group/array/1").unwrap())
        .unwrap()
        .is_some());
}

#[test]
fn array_dialects_v3_metadata_round_trip() {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(
        vec![3, 3],
        DataType::Float32,
        vec![2, 2].try_into().unwrap(),
        FillValue::from(f32::NAN),
    )
    .build(store.clone(), "/array")
    .unwrap();
    array.store_metadata().unwrap();
    let zarr_json: serde_json::Value =
        serde_json::from_slice(&stored(&store, "array/zarr.json")).unwrap();
    assert_eq!(zarr_json["fill_value"], "NaN");
    assert_eq!(zarr_json["node_type"], "array");

    let array = Array::open(store, "/array").unwrap();
    let elements = array
        .retrieve_chunk_elements::<f32>(&[1, 1])
        .unwrap();
    assert!(elements.iter().all(|element| element.is_nan()));
}
