use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::metadata::v3::codec::blosc::{
    BloscCodecConfiguration, BloscCodecConfigurationV1, BloscCompressionLevel, BloscCompressor,
    BloscShuffleMode,
};

/// Configuration parameters for the `numcodecs` `blosc` compressor.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct BloscCodecConfigurationNumcodecs {
    /// The compressor.
    pub cname: BloscCompressor,
    /// The compression level.
    pub clevel: BloscCompressionLevel,
    /// The shuffle mode.
    pub shuffle: BloscShuffleModeNumcodecs,
    /// The compression block size. Automatically determined if 0.
    #[serde(default)]
    pub blocksize: usize,
}

/// The `numcodecs` `blosc` shuffle modes.
#[derive(Serialize_repr, Deserialize_repr, Copy, Clone, Eq, PartialEq, Debug)]
#[repr(i8)]
pub enum BloscShuffleModeNumcodecs {
    /// No shuffling.
    NoShuffle = 0,
    /// Byte-wise shuffling.
    Shuffle = 1,
    /// Bit-wise shuffling.
    BitShuffle = 2,
    /// Bit-wise shuffling for elements of one byte, byte-wise shuffling otherwise.
    AutoShuffle = -1,
}

/// Convert a `numcodecs` `blosc` configuration to a `blosc` codec configuration for elements of `element_size` bytes.
#[must_use]
pub fn codec_blosc_v2_numcodecs_to_v3(
    blosc: &BloscCodecConfigurationNumcodecs,
    element_size: usize,
) -> BloscCodecConfiguration {
    let shuffle = match blosc.shuffle {
        BloscShuffleModeNumcodecs::NoShuffle => BloscShuffleMode::NoShuffle,
        BloscShuffleModeNumcodecs::Shuffle => BloscShuffleMode::Shuffle,
        BloscShuffleModeNumcodecs::BitShuffle => BloscShuffleMode::BitShuffle,
        BloscShuffleModeNumcodecs::AutoShuffle if element_size == 1 => BloscShuffleMode::BitShuffle,
        BloscShuffleModeNumcodecs::AutoShuffle => BloscShuffleMode::Shuffle,
    };
    BloscCodecConfiguration::V1(BloscCodecConfigurationV1 {
        cname: blosc.cname,
        clevel: blosc.clevel,
        shuffle,
        typesize: Some(element_size),
        blocksize: blosc.blocksize,
    })
}

/// Convert a `blosc` codec configuration to the `numcodecs` `blosc` configuration.
#[must_use]
pub fn codec_blosc_v3_to_v2_numcodecs(
    blosc: &BloscCodecConfiguration,
) -> BloscCodecConfigurationNumcodecs {
    let BloscCodecConfiguration::V1(blosc) = blosc;
    BloscCodecConfigurationNumcodecs {
        cname: blosc.cname,
        clevel: blosc.clevel,
        shuffle: match blosc.shuffle {
            BloscShuffleMode::NoShuffle => BloscShuffleModeNumcodecs::NoShuffle,
            BloscShuffleMode::Shuffle => BloscShuffleModeNumcodecs::Shuffle,
            BloscShuffleMode::BitShuffle => BloscShuffleModeNumcodecs::BitShuffle,
        },
        blocksize: blosc.blocksize,
    }
}
