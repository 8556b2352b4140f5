//! A rust library for chunked, codec-pipelined multidimensional arrays stored in the [Zarr](https://zarr.dev) V2 and V3 formats.
//!
//! Arrays written in either metadata dialect produce byte-identical chunk payloads for an equivalent codec chain.
//! Chunks can also be *virtual*: a [`ChunkManifest`](crate::array::chunk_manifest::ChunkManifest) maps chunk coordinates to byte ranges inside foreign files, which are decoded exactly like natively stored chunks.
//!
//! ## Getting Started
//! [`array::Array`] and [`storage`] are good places to start.
//!
//! ## Example
//! ```rust
//! # use std::sync::Arc;
//! use zarrs_virtual::array::{ArrayBuilder, DataType, FillValue};
//! use zarrs_virtual::array_subset::ArraySubset;
//! use zarrs_virtual::storage::store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::default());
//! let array = ArrayBuilder::new(
//!     vec![8, 8],
//!     DataType::Float32,
//!     vec![4, 4].try_into()?,
//!     FillValue::from(0.0f32),
//! )
//! .build(store, "/array")?;
//! array.store_metadata()?;
//!
//! array.store_array_subset_elements::<f32>(
//!     &ArraySubset::new_with_ranges(&[3..5, 3..5]),
//!     &[1.0, 2.0, 3.0, 4.0],
//! )?;
//! let elements = array.retrieve_array_subset_elements::<f32>(&ArraySubset::new_with_ranges(&[4..5, 3..6]))?;
//! assert_eq!(elements, vec![3.0, 4.0, 0.0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Features
//! #### Default
//!  - Codecs: `bitround`, `crc32c`, `gzip`, `transpose`, `zstd`.
//!  - Storage adapters: `zip`.
//!
//! ## Logging
//! Diagnostics are emitted through the [`log`] facade. No logger is installed by this crate.
//!
//! ## Licence
//! `zarrs_virtual` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod array;
pub mod array_subset;
pub mod byte_range;
pub mod config;
pub mod metadata;
pub mod node;
pub mod plugin;
pub mod storage;
