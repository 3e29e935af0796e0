//! Remote vehicle lookup.
//!
//! `VehicleLookup` is the seam the rest of the crate depends on; `ApiClient`
//! implements it against the DVLA Vehicle Enquiry Service (directly, or
//! through a proxy that injects the API key).

pub mod client;
pub mod error;

use std::future::Future;

use crate::models::VehicleDetailRecord;

pub use client::ApiClient;
pub use error::{ErrorEnvelope, LookupError};

/// Fetches the provider record for a registration number.
///
/// Implementations do not retry; callers decide what to do with a failure.
pub trait VehicleLookup: Send + Sync {
    fn fetch_details(
        &self,
        registration_number: &str,
    ) -> impl Future<Output = Result<VehicleDetailRecord, LookupError>> + Send;
}
