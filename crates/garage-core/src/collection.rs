//! The list of tracked vehicles.
//!
//! `VehicleCollection` owns the in-memory list, the current selection and
//! the validation state. Every change to the list is written through to the
//! `RecordStore` before the call returns; if that write fails the list keeps
//! its previous contents.

use chrono::Duration;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::api::{LookupError, VehicleLookup};
use crate::error::{GarageError, Result};
use crate::fetch::FetchGate;
use crate::models::{VehicleDetailRecord, VehicleSummary};
use crate::store::{RecordStore, ValidationMarker};

/// Vehicles a brand-new garage starts with.
pub const DEFAULT_REGISTRATIONS: [&str; 4] = ["ABC123", "XYZ789", "LMN456", "DEF012"];

/// Progress of the bulk validation pass for this collection instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    NotStarted,
    Running,
    Done,
}

/// One vehicle to check in a validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationTarget {
    pub id: u64,
    pub registration_number: String,
}

/// The captured result of checking one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub id: u64,
    pub registration_number: String,
    pub result: std::result::Result<VehicleDetailRecord, LookupError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub checked: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Outcomes for vehicles removed while the pass was running
    pub skipped: usize,
}

/// Look up every target concurrently, each under its `gate` permit. A failed
/// lookup becomes an outcome like any other; nothing here fails as a whole.
pub async fn run_validation<L: VehicleLookup>(
    lookup: &L,
    gate: &FetchGate,
    targets: Vec<ValidationTarget>,
) -> Vec<ValidationOutcome> {
    debug!(count = targets.len(), "Validating vehicles");
    let checks = targets.into_iter().map(|target| async move {
        let result = gate.fetch(lookup, &target.registration_number).await;
        ValidationOutcome {
            id: target.id,
            registration_number: target.registration_number,
            result,
        }
    });
    join_all(checks).await
}

pub struct VehicleCollection {
    vehicles: Vec<VehicleSummary>,
    selected: Option<u64>,
    /// Highest id handed out by this instance, so ids are never reused
    highest_id: u64,
    validation: ValidationState,
    store: RecordStore,
    gate: FetchGate,
}

impl VehicleCollection {
    /// Load the persisted list, seeding the default vehicles on first run.
    pub fn load(store: RecordStore) -> Result<Self> {
        Self::load_with_gate(store, FetchGate::new())
    }

    /// Like `load`, sharing `gate` with the detail sessions.
    pub fn load_with_gate(store: RecordStore, gate: FetchGate) -> Result<Self> {
        let vehicles = match store.load_vehicles()? {
            Some(vehicles) => {
                info!(count = vehicles.len(), "Loaded garage");
                vehicles
            }
            None => {
                let seeded = default_vehicles();
                store.save_vehicles(&seeded)?;
                info!(count = seeded.len(), "Seeded new garage with default vehicles");
                seeded
            }
        };

        let highest_id = vehicles.iter().map(|v| v.id).max().unwrap_or(0);

        Ok(Self {
            vehicles,
            selected: None,
            highest_id,
            validation: ValidationState::NotStarted,
            store,
            gate,
        })
    }

    pub fn vehicles(&self) -> &[VehicleSummary] {
        &self.vehicles
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&VehicleSummary> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn find_by_registration(&self, registration: &str) -> Option<&VehicleSummary> {
        self.vehicles
            .iter()
            .find(|v| v.registration_number == registration)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn gate(&self) -> &FetchGate {
        &self.gate
    }

    fn next_id(&self) -> u64 {
        let max_existing = self.vehicles.iter().map(|v| v.id).max().unwrap_or(0);
        max_existing.max(self.highest_id) + 1
    }

    /// Persist `vehicles`, then make them the current list.
    fn commit(&mut self, vehicles: Vec<VehicleSummary>) -> Result<()> {
        self.store.save_vehicles(&vehicles)?;
        self.vehicles = vehicles;
        Ok(())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Look up `registration_number` and append it to the garage.
    pub async fn add<L: VehicleLookup>(
        &mut self,
        lookup: &L,
        registration_number: &str,
    ) -> Result<VehicleSummary> {
        let registration = self.begin_add(registration_number)?;
        let result = self.gate.fetch(lookup, &registration).await;
        self.finish_add(&registration, result)
    }

    /// Check that `registration_number` can be added. Returns it trimmed,
    /// ready to look up.
    pub fn begin_add(&self, registration_number: &str) -> Result<String> {
        let registration = registration_number.trim();
        if registration.is_empty() {
            return Err(GarageError::EmptyRegistration);
        }
        if self.find_by_registration(registration).is_some() {
            return Err(GarageError::DuplicateRegistration(registration.to_string()));
        }
        Ok(registration.to_string())
    }

    /// Append `registration` using the result of its lookup. The duplicate
    /// check runs again since the list may have changed during the lookup.
    pub fn finish_add(
        &mut self,
        registration: &str,
        lookup_result: std::result::Result<VehicleDetailRecord, LookupError>,
    ) -> Result<VehicleSummary> {
        let detail = lookup_result.map_err(|e| {
            warn!(registration = %registration, error = %e, "Lookup failed, vehicle not added");
            e
        })?;
        if self.find_by_registration(registration).is_some() {
            return Err(GarageError::DuplicateRegistration(registration.to_string()));
        }

        let id = self.next_id();
        let summary = VehicleSummary::from_detail(id, registration, &detail);

        let mut updated = self.vehicles.clone();
        updated.push(summary.clone());
        self.commit(updated)?;
        self.highest_id = id;

        info!(id, registration = %registration, "Vehicle added");
        Ok(summary)
    }

    /// Remove the vehicle with `id`, clearing the selection if it pointed at it.
    /// Returns None when no such vehicle exists.
    pub fn remove(&mut self, id: u64) -> Result<Option<VehicleSummary>> {
        let Some(index) = self.vehicles.iter().position(|v| v.id == id) else {
            debug!(id, "Remove requested for unknown vehicle");
            return Ok(None);
        };

        let mut updated = self.vehicles.clone();
        let removed = updated.remove(index);
        self.commit(updated)?;

        if self.selected == Some(id) {
            self.selected = None;
        }

        info!(id, registration = %removed.registration_number, "Vehicle removed");
        Ok(Some(removed))
    }

    /// Remove by registration number instead of id.
    pub fn remove_registration(&mut self, registration: &str) -> Result<Option<VehicleSummary>> {
        match self.find_by_registration(registration).map(|v| v.id) {
            Some(id) => self.remove(id),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Point the selection at `id`. An unknown id leaves nothing selected.
    pub fn select(&mut self, id: u64) -> bool {
        if self.get(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            self.selected = None;
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&VehicleSummary> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<u64> {
        self.selected
    }

    // =========================================================================
    // Validation
    // =========================================================================

    pub fn validation_state(&self) -> ValidationState {
        self.validation
    }

    /// Whether the automatic pass should run now. It runs once per
    /// instance; with a `window`, a sentinel newer than it also holds it off.
    pub fn should_auto_validate(&self, window: Option<Duration>) -> Result<bool> {
        if self.validation != ValidationState::NotStarted {
            return Ok(false);
        }
        let Some(window) = window else {
            return Ok(true);
        };
        Ok(match self.store.load_validation_marker()? {
            Some(marker) => marker.is_older_than(window),
            None => true,
        })
    }

    /// Mark a pass as running and return what to check.
    /// Returns None while another pass is still running.
    pub fn begin_validation(&mut self) -> Option<Vec<ValidationTarget>> {
        if self.validation == ValidationState::Running {
            debug!("Validation already running");
            return None;
        }
        self.validation = ValidationState::Running;
        Some(
            self.vehicles
                .iter()
                .map(|v| ValidationTarget {
                    id: v.id,
                    registration_number: v.registration_number.clone(),
                })
                .collect(),
        )
    }

    /// Apply the outcomes of a pass, persist the list and write the sentinel.
    pub fn finish_validation(&mut self, outcomes: Vec<ValidationOutcome>) -> Result<ValidationReport> {
        self.validation = ValidationState::Done;

        let mut report = ValidationReport {
            checked: outcomes.len(),
            ..Default::default()
        };
        let mut updated = self.vehicles.clone();

        for outcome in outcomes {
            let Some(vehicle) = updated
                .iter_mut()
                .find(|v| v.id == outcome.id && v.registration_number == outcome.registration_number)
            else {
                report.skipped += 1;
                continue;
            };

            match outcome.result {
                Ok(detail) => {
                    vehicle.mark_valid(&detail);
                    report.valid += 1;
                }
                Err(e) => {
                    debug!(registration = %vehicle.registration_number, error = %e, "Vehicle failed validation");
                    vehicle.mark_invalid(e.to_string());
                    report.invalid += 1;
                }
            }
        }

        self.commit(updated)?;
        self.store.save_validation_marker(&ValidationMarker::now())?;

        info!(
            checked = report.checked,
            valid = report.valid,
            invalid = report.invalid,
            skipped = report.skipped,
            "Validation complete"
        );
        Ok(report)
    }

    /// Check every vehicle against the provider and record the results.
    pub async fn validate_all<L: VehicleLookup>(&mut self, lookup: &L) -> Result<ValidationReport> {
        let Some(targets) = self.begin_validation() else {
            return Ok(ValidationReport::default());
        };
        let outcomes = run_validation(lookup, &self.gate, targets).await;
        self.finish_validation(outcomes)
    }
}

fn default_vehicles() -> Vec<VehicleSummary> {
    DEFAULT_REGISTRATIONS
        .iter()
        .zip(1u64..)
        .map(|(reg, id)| VehicleSummary::new(id, *reg))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
