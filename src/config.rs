//! Global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the `zarrs_virtual` crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// # Codec Configuration Options
///
/// ## Validate Checksums
///  > default: [`true`]
///
/// If enabled, checksum codecs (e.g. `crc32c`) will validate that encoded data matches stored checksums, otherwise validation is skipped.
///
/// # Metadata Configuration Options
///
/// ## Coerce Numeric String Fill Value
///  > default: [`false`]
///
/// Legacy (V2) metadata sometimes declares an integer fill value such as `0` for a string array.
/// By default this is rejected as a fill value type mismatch.
/// If enabled, the number is instead coerced to its decimal string form (e.g. `0` becomes `"0"`).
///
/// # Concurrency Configuration Options
///
/// ## Chunk Concurrent Limit
/// > default: [`std::thread::available_parallelism`]`()`
///
/// For array operations involving multiple chunks, this is the maximum number of chunks that are encoded or decoded concurrently.
/// The concurrent limit is disabled if set to zero.
#[derive(Debug)]
pub struct Config {
    validate_checksums: bool,
    coerce_numeric_string_fill_value: bool,
    chunk_concurrent_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            validate_checksums: true,
            coerce_numeric_string_fill_value: false,
            chunk_concurrent_limit: std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

impl Config {
    /// Get the [validate checksums](#validate-checksums) configuration.
    #[must_use]
    pub fn validate_checksums(&self) -> bool {
        self.validate_checksums
    }

    /// Set the [validate checksums](#validate-checksums) configuration.
    pub fn set_validate_checksums(&mut self, validate_checksums: bool) {
        self.validate_checksums = validate_checksums;
    }

    /// Get the [coerce numeric string fill value](#coerce-numeric-string-fill-value) configuration.
    #[must_use]
    pub fn coerce_numeric_string_fill_value(&self) -> bool {
        self.coerce_numeric_string_fill_value
    }

    /// Set the [coerce numeric string fill value](#coerce-numeric-string-fill-value) configuration.
    pub fn set_coerce_numeric_string_fill_value(&mut self, coerce: bool) {
        self.coerce_numeric_string_fill_value = coerce;
    }

    /// Get the [chunk concurrent limit](#chunk-concurrent-limit) configuration.
    #[must_use]
    pub fn chunk_concurrent_limit(&self) -> usize {
        self.chunk_concurrent_limit
    }

    /// Set the [chunk concurrent limit](#chunk-concurrent-limit) configuration.
    pub fn set_chunk_concurrent_limit(&mut self, concurrent_limit: usize) {
        self.chunk_concurrent_limit = concurrent_limit;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}
