//! The `pcodec` array to bytes codec.
//!
//! [Pcodec](https://github.com/mwlon/pcodec) (or Pco, pronounced "pico") losslessly compresses and decompresses numerical sequences with high compression ratio and fast speed.
//!
//! Supported data types are the 16, 32 and 64 bit integer and floating point types and the numpy datetime/timedelta types.
//!
//! This codec requires the `pcodec` feature, which is disabled by default.
//!
//! The codec is also matched by the name `numcodecs.pcodec`, and the `numcodecs` `pcodec` compressor of Zarr V2 arrays maps to it.
//!
//! ### Example `JSON` metadata
//! ```json
//! {
//!     "name": "pcodec",
//!     "configuration": {
//!         "level": 8,
//!         "mode_spec": "auto",
//!         "delta_spec": "auto",
//!         "paging_spec": "equal_pages_up_to",
//!         "delta_encoding_order": null,
//!         "equal_pages_up_to": 262144
//!     }
//! }
//! ```

mod pcodec_codec;

pub use crate::metadata::v3::codec::pcodec::{
    PcodecCodecConfiguration, PcodecCodecConfigurationV1, PcodecCompressionLevel,
    PcodecDeltaEncodingOrder, PcodecDeltaSpecConfiguration, PcodecModeSpecConfiguration,
    PcodecPagingSpecConfiguration, IDENTIFIER, IDENTIFIER_NUMCODECS,
};
pub use pcodec_codec::PcodecCodec;

use crate::{
    array::codec::{Codec, CodecPlugin},
    metadata::v3::MetadataV3,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_pcodec, create_codec_pcodec)
}

fn is_name_pcodec(name: &str) -> bool {
    name.eq(IDENTIFIER) || name.eq(IDENTIFIER_NUMCODECS)
}

pub(crate) fn create_codec_pcodec(metadata: &MetadataV3) -> Result<Codec, PluginCreateError> {
    let configuration: PcodecCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(PcodecCodec::new_with_configuration(&configuration));
    Ok(Codec::ArrayToBytes(codec))
}
