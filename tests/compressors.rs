//! Arrays shaped like the `zarr-python` compressor fixtures: a 10x10 `float32` array in 5x5 chunks holding 0..100.

use std::sync::Arc;

use zarrs_virtual::{
    array::{Array, ArrayMetadata},
    array_subset::ArraySubset,
    storage::{store::MemoryStore, ReadableStorageTraits, StoreKey},
};

fn elements() -> Vec<f32> {
    (0..100u8).map(f32::from).collect()
}

fn metadata_v2(compressor: &str, order: &str) -> String {
    format!(
        r#"{{
            "zarr_format": 2,
            "shape": [10, 10],
            "chunks": [5, 5],
            "dtype": "<f4",
            "compressor": {compressor},
            "fill_value": 0.0,
            "order": "{order}",
            "filters": null,
            "dimension_separator": "."
        }}"#
    )
}

fn metadata_v3(codecs: &str) -> String {
    format!(
        r#"{{
            "zarr_format": 3,
            "node_type": "array",
            "shape": [10, 10],
            "data_type": "float32",
            "chunk_grid": {{"name": "regular", "configuration": {{"chunk_shape": [5, 5]}}}},
            "chunk_key_encoding": {{"name": "default", "configuration": {{"separator": "/"}}}},
            "fill_value": 0.0,
            "codecs": {codecs}
        }}"#
    )
}

/// Write the fixture elements through an array created from `json`, then reopen the array from the store and read them back.
fn write_and_reopen(store: &Arc<MemoryStore>, path: &str, json: &str) -> Vec<f32> {
    let metadata: ArrayMetadata = serde_json::from_str(json).unwrap();
    let array = Array::new_with_metadata(store.clone(), path, metadata).unwrap();
    array.store_metadata().unwrap();
    let subset = ArraySubset::new_with_shape(vec![10, 10]);
    array
        .store_array_subset_elements(&subset, &elements())
        .unwrap();

    let array = Array::open(store.clone(), path).unwrap();
    array.retrieve_array_subset_elements::<f32>(&subset).unwrap()
}

fn stored(store: &MemoryStore, key: &str) -> Vec<u8> {
    store
        .get(&StoreKey::new(key).unwrap())
        .unwrap()
        .unwrap()
        .to_vec()
}

#[cfg(feature = "blosc")]
#[test]
fn compressor_blosc() {
    let store = Arc::new(MemoryStore::new());
    let blosc_v2 = r#"{"id": "blosc", "cname": "zstd", "clevel": 1, "shuffle": 2, "blocksize": 0}"#;
    for (path, order) in [("/blosc_c", "C"), ("/blosc_f", "F")] {
        assert_eq!(
            write_and_reopen(&store, path, &metadata_v2(blosc_v2, order)),
            elements(),
            "{order}"
        );
    }
    let v3 = metadata_v3(
        r#"[
            {"name": "bytes", "configuration": {"endian": "little"}},
            {"name": "blosc", "configuration": {"cname": "zstd", "clevel": 1, "shuffle": "bitshuffle", "typesize": 4, "blocksize": 0}}
        ]"#,
    );
    assert_eq!(write_and_reopen(&store, "/blosc_v3", &v3), elements());

    // The converted Zarr V2 configuration encodes identically to the Zarr V3 one
    assert_eq!(stored(&store, "blosc_c/1.0"), stored(&store, "blosc_v3/c/1/0"));
    assert_ne!(stored(&store, "blosc_c/1.0"), stored(&store, "blosc_f/1.0"));
}

#[cfg(feature = "bz2")]
#[test]
fn compressor_bz2() {
    let store = Arc::new(MemoryStore::new());
    let v2 = metadata_v2(r#"{"id": "bz2", "level": 9}"#, "C");
    assert_eq!(write_and_reopen(&store, "/bz2", &v2), elements());
    let v3 = metadata_v3(
        r#"[
            {"name": "bytes", "configuration": {"endian": "little"}},
            {"name": "numcodecs.bz2", "configuration": {"level": 9}}
        ]"#,
    );
    assert_eq!(write_and_reopen(&store, "/bz2_v3", &v3), elements());
    assert!(stored(&store, "bz2/0.0").starts_with(b"BZh9"));
    assert_eq!(stored(&store, "bz2/0.0"), stored(&store, "bz2_v3/c/0/0"));
}

#[cfg(feature = "fletcher32")]
#[test]
fn compressor_fletcher32() {
    let store = Arc::new(MemoryStore::new());
    let v3 = metadata_v3(
        r#"[
            {"name": "bytes", "configuration": {"endian": "little"}},
            {"name": "numcodecs.fletcher32"}
        ]"#,
    );
    assert_eq!(write_and_reopen(&store, "/fletcher32", &v3), elements());
    // 25 float32 elements and a 4 byte checksum
    assert_eq!(stored(&store, "fletcher32/c/0/0").len(), 25 * 4 + 4);

    let v2 = metadata_v2(r#"{"id": "fletcher32"}"#, "C");
    assert_eq!(write_and_reopen(&store, "/fletcher32_v2", &v2), elements());
    assert_eq!(
        stored(&store, "fletcher32/c/1/1"),
        stored(&store, "fletcher32_v2/1.1")
    );
}

#[cfg(feature = "zfp")]
#[test]
fn compressor_zfpy() {
    let within_tolerance = |decoded: Vec<f32>| {
        for (decoded, element) in decoded.iter().zip(elements()) {
            assert!((decoded - element).abs() <= 0.01, "{decoded} {element}");
        }
    };
    let store = Arc::new(MemoryStore::new());
    let v2 = metadata_v2(
        r#"{"id": "zfpy", "mode": 4, "tolerance": 0.01, "rate": -1, "precision": -1}"#,
        "C",
    );
    within_tolerance(write_and_reopen(&store, "/zfpy", &v2));
    let v3 = metadata_v3(
        r#"[{"name": "numcodecs.zfpy", "configuration": {"mode": 4, "tolerance": 0.01}}]"#,
    );
    within_tolerance(write_and_reopen(&store, "/zfpy_v3", &v3));
    assert!(stored(&store, "zfpy/0.0").starts_with(b"zfp"));
    assert_eq!(stored(&store, "zfpy/0.0"), stored(&store, "zfpy_v3/c/0/0"));
}

#[cfg(feature = "pcodec")]
#[test]
fn compressor_pcodec() {
    let store = Arc::new(MemoryStore::new());
    let v2 = metadata_v2(
        r#"{"id": "pcodec", "level": 8, "mode_spec": "auto", "delta_spec": "auto", "paging_spec": "equal_pages_up_to", "delta_encoding_order": null, "equal_pages_up_to": 262144}"#,
        "C",
    );
    assert_eq!(write_and_reopen(&store, "/pcodec", &v2), elements());
    let v3 = metadata_v3(r#"[{"name": "numcodecs.pcodec", "configuration": {"level": 8}}]"#);
    assert_eq!(write_and_reopen(&store, "/pcodec_v3", &v3), elements());
    assert_eq!(stored(&store, "pcodec/1.1"), stored(&store, "pcodec_v3/c/1/1"));
}
