use std::sync::Arc;

use zarrs_virtual::{
    array::{Array, ArrayCreateError, ArrayMetadata, FillValue},
    array_subset::ArraySubset,
    storage::store::MemoryStore,
};

fn array_v3(data_type: &str, fill_value: Option<&str>) -> Result<Array<MemoryStore>, ArrayCreateError> {
    let fill_value = fill_value.map_or(String::new(), |fill_value| {
        format!(r#""fill_value": {fill_value},"#)
    });
    let json = format!(
        r#"{{
            "zarr_format": 3,
            "node_type": "array",
            "shape": [5],
            "data_type": {data_type},
            "chunk_grid": {{"name": "regular", "configuration": {{"chunk_shape": [2]}}}},
            "chunk_key_encoding": {{"name": "default"}},
            {fill_value}
            "codecs": [{{"name": "bytes", "configuration": {{"endian": "little"}}}}]
        }}"#
    );
    let metadata: ArrayMetadata = serde_json::from_str(&json).unwrap();
    Array::new_with_metadata(Arc::new(MemoryStore::new()), "/", metadata)
}

fn array_v2(dtype: &str, fill_value: &str) -> Result<Array<MemoryStore>, ArrayCreateError> {
    let json = format!(
        r#"{{
            "zarr_format": 2,
            "shape": [5],
            "chunks": [2],
            "dtype": "{dtype}",
            "compressor": null,
            "fill_value": {fill_value},
            "order": "C",
            "filters": null
        }}"#
    );
    let metadata: ArrayMetadata = serde_json::from_str(&json).unwrap();
    Array::new_with_metadata(Arc::new(MemoryStore::new()), "/", metadata)
}

fn all() -> ArraySubset {
    ArraySubset::new_with_shape(vec![5])
}

#[test]
fn fill_value_defaults_partial_write() {
    let array = array_v3(r#""bool""#, None).unwrap();
    array
        .store_array_subset_elements(&ArraySubset::new_with_ranges(&[0..2]), &[true, true])
        .unwrap();
    assert_eq!(
        array.retrieve_array_subset_elements::<bool>(&all()).unwrap(),
        vec![true, true, false, false, false]
    );

    let array = array_v3(r#""int32""#, None).unwrap();
    array
        .store_array_subset_elements(&ArraySubset::new_with_ranges(&[0..2]), &[5i32, 6])
        .unwrap();
    assert_eq!(
        array.retrieve_array_subset_elements::<i32>(&all()).unwrap(),
        vec![5, 6, 0, 0, 0]
    );

    let array = array_v3(r#""float32""#, None).unwrap();
    array
        .store_array_subset_elements(&ArraySubset::new_with_ranges(&[0..2]), &[1.5f32, 2.5])
        .unwrap();
    assert_eq!(
        array.retrieve_array_subset_elements::<f32>(&all()).unwrap(),
        vec![1.5, 2.5, 0.0, 0.0, 0.0]
    );
}

#[test]
fn fill_value_partial_chunk_write() {
    let array = array_v3(r#""int32""#, Some("-9")).unwrap();
    array
        .store_array_subset_elements(&ArraySubset::new_with_ranges(&[0..1]), &[1i32])
        .unwrap();
    assert_eq!(array.retrieve_chunk_elements::<i32>(&[0]).unwrap(), vec![1, -9]);
}

#[test]
fn fill_value_datetime_not_a_time() {
    let array = array_v3(
        r#"{"name": "numpy.datetime64", "configuration": {"unit": "s", "scale_factor": 1}}"#,
        None,
    )
    .unwrap();
    assert_eq!(array.fill_value(), &FillValue::from(i64::MIN));
    assert_eq!(
        array.retrieve_array_subset_elements::<i64>(&all()).unwrap(),
        vec![i64::MIN; 5]
    );

    let array = array_v2("<m8[10ms]", "null").unwrap();
    assert_eq!(array.fill_value(), &FillValue::from(i64::MIN));
    let array = array_v3(
        r#"{"name": "numpy.timedelta64", "configuration": {"unit": "D", "scale_factor": 1}}"#,
        Some(r#""NaT""#),
    )
    .unwrap();
    assert_eq!(array.fill_value(), &FillValue::from(i64::MIN));
}

#[test]
fn fill_value_null_string() {
    let array = array_v3(r#""string""#, Some("null"));
    // a string array needs a variable length codec
    assert!(matches!(array, Err(ArrayCreateError::InvalidMetadata(_))));

    let metadata: ArrayMetadata = serde_json::from_str(
        r#"{
            "zarr_format": 3,
            "node_type": "array",
            "shape": [5],
            "data_type": "string",
            "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": [2]}},
            "chunk_key_encoding": {"name": "default"},
            "fill_value": null,
            "codecs": [{"name": "vlen-utf8"}]
        }"#,
    )
    .unwrap();
    let array = Array::new_with_metadata(Arc::new(MemoryStore::new()), "/", metadata).unwrap();
    assert_eq!(array.fill_value(), &FillValue::from(""));
    array
        .store_array_subset_elements(&ArraySubset::new_with_ranges(&[0..3]), &["a", "bb", ""])
        .unwrap();
    assert_eq!(
        array.retrieve_array_subset_elements::<String>(&all()).unwrap(),
        vec!["a", "bb", "", "", ""]
    );
}

#[test]
fn fill_value_v2_legacy_coercion() {
    assert_eq!(array_v2("<i4", "null").unwrap().fill_value(), &FillValue::from(0i32));
    assert_eq!(array_v2("|b1", "null").unwrap().fill_value(), &FillValue::from(false));
    assert_eq!(array_v2("|b1", "1").unwrap().fill_value(), &FillValue::from(true));
    assert_eq!(array_v2("|b1", "false").unwrap().fill_value(), &FillValue::from(false));
    assert_eq!(array_v2("<f8", r#""-Infinity""#).unwrap().fill_value(), &FillValue::from(f64::NEG_INFINITY));
    assert_eq!(array_v2(">u2", "513").unwrap().fill_value(), &FillValue::from(513u16));
    assert!(array_v2("|b1", "2").is_err());
}

#[test]
fn fill_value_type_mismatch() {
    for (data_type, fill_value) in [
        (r#""int32""#, r#""abc""#),
        (r#""int32""#, "1.5"),
        (r#""uint8""#, "256"),
        (r#""uint8""#, "-1"),
        (r#""bool""#, "0"),
        (r#""float32""#, "true"),
        (r#""float32""#, r#""0x0000""#),
    ] {
        assert!(
            matches!(
                array_v3(data_type, Some(fill_value)),
                Err(ArrayCreateError::InvalidFillValueMetadata(_))
            ),
            "{data_type} {fill_value}"
        );
    }
}
