use serde::{Deserialize, Serialize};

use super::VehicleDetailRecord;

/// Outcome of the last check of a vehicle against the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,
    Invalid,
    #[default]
    Unvalidated,
}

impl ValidationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ValidationStatus::Valid => "valid",
            ValidationStatus::Invalid => "invalid",
            ValidationStatus::Unvalidated => "unchecked",
        }
    }
}

/// A tracked vehicle as shown in the garage list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSummary {
    pub id: u64,
    pub registration_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_of_manufacture: Option<i32>,
    #[serde(default)]
    pub validation_status: ValidationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

impl VehicleSummary {
    /// A bare entry with nothing known beyond the registration.
    pub fn new(id: u64, registration_number: impl Into<String>) -> Self {
        Self {
            id,
            registration_number: registration_number.into(),
            make: None,
            model: None,
            colour: None,
            fuel_type: None,
            year_of_manufacture: None,
            validation_status: ValidationStatus::Unvalidated,
            validation_error: None,
        }
    }

    /// Build a summary from a freshly fetched record.
    pub fn from_detail(id: u64, registration_number: impl Into<String>, detail: &VehicleDetailRecord) -> Self {
        let mut summary = Self::new(id, registration_number);
        summary.mark_valid(detail);
        summary
    }

    /// Copy the descriptive fields from `detail` and clear any previous error.
    pub fn mark_valid(&mut self, detail: &VehicleDetailRecord) {
        if !detail.make.is_empty() {
            self.make = Some(detail.make.clone());
        }
        self.colour = detail.colour.clone().or_else(|| self.colour.take());
        self.fuel_type = detail.fuel_type.clone().or_else(|| self.fuel_type.take());
        self.year_of_manufacture = detail.year_of_manufacture.or(self.year_of_manufacture);
        self.validation_status = ValidationStatus::Valid;
        self.validation_error = None;
    }

    /// Keep the entry but record why it failed the last check.
    pub fn mark_invalid(&mut self, message: impl Into<String>) {
        self.validation_status = ValidationStatus::Invalid;
        self.validation_error = Some(message.into());
    }

    /// "BLUE FORD (2004)" style description, empty when nothing is known.
    pub fn description(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(ref colour) = self.colour {
            parts.push(colour);
        }
        if let Some(ref make) = self.make {
            parts.push(make);
        }
        if let Some(ref model) = self.model {
            parts.push(model);
        }
        let mut text = parts.join(" ");
        if let Some(year) = self.year_of_manufacture {
            if text.is_empty() {
                text = year.to_string();
            } else {
                text = format!("{} ({})", text, year);
            }
        }
        text
    }
}
