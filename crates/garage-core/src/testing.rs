//! In-memory lookup fake shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::api::{LookupError, VehicleLookup};
use crate::models::VehicleDetailRecord;

/// Answers lookups from a fixed table and counts calls.
/// Unknown registrations answer `NotFound`.
#[derive(Default)]
pub struct MockLookup {
    responses: Mutex<HashMap<String, Result<VehicleDetailRecord, LookupError>>>,
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, record: VehicleDetailRecord) -> Self {
        self.set(&record.registration_number.clone(), Ok(record));
        self
    }

    pub fn with_error(self, registration: &str, err: LookupError) -> Self {
        self.set(registration, Err(err));
        self
    }

    pub fn set(&self, registration: &str, response: Result<VehicleDetailRecord, LookupError>) {
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .insert(registration.to_string(), response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of lookups that were in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl VehicleLookup for MockLookup {
    async fn fetch_details(&self, registration_number: &str) -> Result<VehicleDetailRecord, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::task::yield_now().await;

        let response = self
            .responses
            .lock()
            .expect("mock lock poisoned")
            .get(registration_number)
            .cloned()
            .unwrap_or(Err(LookupError::NotFound));
        self.active.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

/// A detail record with the descriptive fields filled in.
pub fn record(registration: &str, make: &str, colour: &str, year: i32) -> VehicleDetailRecord {
    let mut record = VehicleDetailRecord::new(registration, make);
    record.colour = Some(colour.to_string());
    record.year_of_manufacture = Some(year);
    record.fuel_type = Some("PETROL".to_string());
    record
}
