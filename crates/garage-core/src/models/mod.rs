//! Data models for garage entities.
//!
//! - `VehicleSummary`: one row of the tracked vehicle list
//! - `VehicleDetailRecord`: the full provider record for a registration
//! - `VehicleImage`: the photo attached to a vehicle

pub mod detail;
pub mod image;
pub mod vehicle;

pub use detail::VehicleDetailRecord;
pub use image::VehicleImage;
pub use vehicle::{ValidationStatus, VehicleSummary};
