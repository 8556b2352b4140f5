//! Storage adapters.
//!
//! An adapter presents a nested resource held in a value of another store (such as a zip archive) as a store.

#[cfg(feature = "zip")]
pub mod zip;
