//! Core library for garage: vehicle lookup client, models, local store and
//! the collection/detail logic the front ends drive.

pub mod api;
pub mod collection;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, LookupError, VehicleLookup};
pub use collection::{
    run_validation, ValidationOutcome, ValidationReport, ValidationState, ValidationTarget,
    VehicleCollection, DEFAULT_REGISTRATIONS,
};
pub use config::Config;
pub use error::{GarageError, Result};
pub use fetch::FetchGate;
pub use models::{ValidationStatus, VehicleDetailRecord, VehicleImage, VehicleSummary};
pub use session::{DetailFetch, DetailState, VehicleDetailSession};
pub use store::{CachedData, RecordStore, StoreError};
