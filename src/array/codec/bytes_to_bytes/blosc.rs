//! The `blosc` bytes to bytes codec.
//!
//! It uses the [blosc](https://www.blosc.org/) container format through the bundled `c-blosc` library.
//!
//! This codec requires the `blosc` feature, which is enabled by default.
//!
//! The `numcodecs` `blosc` compressor of Zarr V2 arrays maps to this codec, with an integer shuffle mode resolved against the element size.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/blosc/v1.0.html>.
//!
//! ### Example `JSON` metadata
//! ```json
//! {
//!     "name": "blosc",
//!     "configuration": {
//!         "cname": "zstd",
//!         "clevel": 1,
//!         "shuffle": "bitshuffle",
//!         "typesize": 4,
//!         "blocksize": 0
//!     }
//! }
//! ```

mod blosc_codec;

use std::ffi::{c_char, c_int, c_void};

pub use crate::metadata::v3::codec::blosc::{
    BloscCodecConfiguration, BloscCodecConfigurationV1, BloscCompressionLevel,
    BloscCompressionLevelError, BloscCompressor, BloscShuffleMode, IDENTIFIER,
};
pub use blosc_codec::BloscCodec;

use blosc_sys::{
    blosc_cbuffer_validate, blosc_compress_ctx, blosc_decompress_ctx, BLOSC_BLOSCLZ_COMPNAME,
    BLOSC_LZ4HC_COMPNAME, BLOSC_LZ4_COMPNAME, BLOSC_MAX_OVERHEAD, BLOSC_SNAPPY_COMPNAME,
    BLOSC_ZLIB_COMPNAME, BLOSC_ZSTD_COMPNAME,
};

use crate::{
    array::codec::{Codec, CodecError, CodecPlugin},
    metadata::v3::MetadataV3,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_blosc, create_codec_blosc)
}

fn is_name_blosc(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

pub(crate) fn create_codec_blosc(metadata: &MetadataV3) -> Result<Codec, PluginCreateError> {
    let configuration: BloscCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(BloscCodec::new_with_configuration(&configuration)?);
    Ok(Codec::BytesToBytes(codec))
}

/// The nul terminated `blosc` name of a compressor.
fn compressor_cstr(compressor: BloscCompressor) -> *const c_char {
    let name: &[u8] = match compressor {
        BloscCompressor::BloscLZ => BLOSC_BLOSCLZ_COMPNAME,
        BloscCompressor::LZ4 => BLOSC_LZ4_COMPNAME,
        BloscCompressor::LZ4HC => BLOSC_LZ4HC_COMPNAME,
        BloscCompressor::Snappy => BLOSC_SNAPPY_COMPNAME,
        BloscCompressor::Zlib => BLOSC_ZLIB_COMPNAME,
        BloscCompressor::Zstd => BLOSC_ZSTD_COMPNAME,
    };
    name.as_ptr().cast::<c_char>()
}

fn blosc_compress_bytes(
    src: &[u8],
    clevel: BloscCompressionLevel,
    shuffle_mode: BloscShuffleMode,
    typesize: usize,
    compressor: BloscCompressor,
    blocksize: usize,
) -> Result<Vec<u8>, CodecError> {
    let destsize = src.len() + BLOSC_MAX_OVERHEAD as usize;
    let mut dest: Vec<u8> = Vec::with_capacity(destsize);
    // SAFETY: `src` is valid for `src.len()` bytes and `dest` has capacity for `destsize` bytes.
    let compressed_size = unsafe {
        blosc_compress_ctx(
            c_int::from(u8::from(clevel)),
            shuffle_mode as c_int,
            typesize,
            src.len(),
            src.as_ptr().cast::<c_void>(),
            dest.as_mut_ptr().cast::<c_void>(),
            destsize,
            compressor_cstr(compressor),
            blocksize,
            1,
        )
    };
    let compressed_size = usize::try_from(compressed_size).unwrap_or_default();
    if compressed_size > 0 {
        // SAFETY: blosc initialised the first `compressed_size` bytes of `dest`.
        unsafe {
            dest.set_len(compressed_size);
        }
        dest.shrink_to_fit();
        Ok(dest)
    } else {
        Err(CodecError::Other(format!(
            "blosc_compress_ctx(clevel: {clevel}, shuffle: {shuffle_mode:?}, typesize: {typesize}, nbytes: {}, compressor: {compressor:?}, blocksize: {blocksize}) failed",
            src.len()
        )))
    }
}

/// Returns the decompressed size of a `blosc` buffer, or [`None`] if the buffer is invalid.
fn blosc_validate(src: &[u8]) -> Option<usize> {
    let mut destsize: usize = 0;
    // SAFETY: `src` is valid for `src.len()` bytes and `destsize` is a valid output location.
    let valid = unsafe {
        blosc_cbuffer_validate(
            src.as_ptr().cast::<c_void>(),
            src.len(),
            std::ptr::addr_of_mut!(destsize),
        )
    } == 0;
    valid.then_some(destsize)
}

fn blosc_decompress_bytes(src: &[u8]) -> Result<Vec<u8>, CodecError> {
    let destsize = blosc_validate(src)
        .ok_or_else(|| CodecError::from("blosc encoded value is invalid"))?;
    let mut dest: Vec<u8> = Vec::with_capacity(destsize);
    // SAFETY: `src` is a validated blosc buffer and `dest` has capacity for its `destsize` decompressed bytes.
    let decompressed_size = unsafe {
        blosc_decompress_ctx(
            src.as_ptr().cast::<c_void>(),
            dest.as_mut_ptr().cast::<c_void>(),
            destsize,
            1,
        )
    };
    match usize::try_from(decompressed_size) {
        Ok(decompressed_size) if decompressed_size == destsize => {
            // SAFETY: blosc initialised the first `decompressed_size` bytes of `dest`.
            unsafe {
                dest.set_len(decompressed_size);
            }
            Ok(dest)
        }
        _ => Err(CodecError::from("blosc_decompress_ctx failed")),
    }
}

#[cfg(test)]
mod tests {
    use crate::array::{
        codec::{BytesToBytesCodecTraits, CodecTraits},
        BytesRepresentation,
    };

    use super::*;

    const JSON_SHUFFLE: &str =
        r#"{"cname": "lz4", "clevel": 5, "shuffle": "shuffle", "typesize": 2, "blocksize": 0}"#;

    const JSON_BITSHUFFLE: &str =
        r#"{"cname": "zstd", "clevel": 1, "shuffle": "bitshuffle", "typesize": 4, "blocksize": 0}"#;

    fn round_trip(json: &str, bytes: &[u8]) {
        let bytes_representation = BytesRepresentation::FixedSize(bytes.len() as u64);
        let configuration: BloscCodecConfiguration = serde_json::from_str(json).unwrap();
        let codec = BloscCodec::new_with_configuration(&configuration).unwrap();
        let encoded = codec.encode(bytes.to_vec().into()).unwrap();
        assert!(
            encoded.len() as u64
                <= codec
                    .compute_encoded_size(&bytes_representation)
                    .size()
                    .unwrap()
        );
        let decoded = codec.decode(encoded, &bytes_representation).unwrap();
        assert_eq!(decoded.to_vec(), bytes);
    }

    #[test]
    fn codec_blosc_round_trip() {
        let elements: Vec<u16> = (0..256).collect();
        round_trip(JSON_SHUFFLE, bytemuck::cast_slice(&elements));
        let elements: Vec<f32> = (0..100).map(|i| i as f32).collect();
        round_trip(JSON_BITSHUFFLE, bytemuck::cast_slice(&elements));
        round_trip(
            r#"{"cname": "blosclz", "clevel": 0, "blocksize": 0}"#,
            &[1, 2, 3],
        );
    }

    #[test]
    fn codec_blosc_metadata() {
        let metadata: MetadataV3 = serde_json::from_str(&format!(
            r#"{{"name": "blosc", "configuration": {JSON_BITSHUFFLE}}}"#
        ))
        .unwrap();
        let Codec::BytesToBytes(codec) = create_codec_blosc(&metadata).unwrap() else {
            panic!()
        };
        assert_eq!(codec.create_metadata(), Some(metadata));
    }

    #[test]
    fn codec_blosc_typesize_required() {
        let metadata: MetadataV3 = serde_json::from_str(
            r#"{"name": "blosc", "configuration": {"cname": "lz4", "clevel": 5, "shuffle": "shuffle", "blocksize": 0}}"#,
        )
        .unwrap();
        assert!(matches!(
            create_codec_blosc(&metadata),
            Err(PluginCreateError::Other(_))
        ));
    }

    #[test]
    fn codec_blosc_decode_invalid() {
        let configuration: BloscCodecConfiguration = serde_json::from_str(JSON_SHUFFLE).unwrap();
        let codec = BloscCodec::new_with_configuration(&configuration).unwrap();
        assert!(codec
            .decode(vec![0u8; 8].into(), &BytesRepresentation::UnboundedSize)
            .is_err());
    }
}
