//! Local persistence for the garage.
//!
//! Everything the application remembers between runs goes through
//! `RecordStore`, which serializes records to JSON and keeps them in a
//! `KeyValueStore` backend under four key namespaces:
//!
//! - `garage_vehicles`: the tracked vehicle list
//! - `garage_vehicles_validated`: the automatic validation sentinel
//! - `vehicle_details_<reg>`: cached provider records
//! - `vehicle_image_<reg>`: attached photos
//!
//! Cached records carry the time they were fetched but never expire; only
//! an explicit refresh replaces them.

pub mod error;
pub mod file;
pub mod kv;
pub mod records;

pub use error::StoreError;
pub use file::FileStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use records::{CachedData, RecordStore, StoreKey, ValidationMarker};
