use serde::{Deserialize, Serialize};

/// Vehicle record as returned by the DVLA Vehicle Enquiry Service.
///
/// The provider leaves out fields it holds no data for, so most attributes
/// are optional. A record is a snapshot of one fetch and is replaced as a
/// whole on refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDetailRecord {
    pub registration_number: String,
    #[serde(default)]
    pub make: String,
    pub colour: Option<String>,
    pub year_of_manufacture: Option<i32>,
    pub month_of_first_registration: Option<String>,
    pub fuel_type: Option<String>,
    pub engine_capacity: Option<u32>,
    pub co2_emissions: Option<u32>,
    pub euro_status: Option<String>,
    pub real_driving_emissions: Option<String>,
    pub mot_status: Option<String>,
    pub mot_expiry_date: Option<String>,
    pub tax_status: Option<String>,
    pub tax_due_date: Option<String>,
    pub art_end_date: Option<String>,
    pub revenue_weight: Option<u32>,
    pub type_approval: Option<String>,
    pub wheelplan: Option<String>,
    #[serde(default)]
    pub marked_for_export: bool,
    #[serde(rename = "dateOfLastV5CIssued")]
    pub date_of_last_v5c_issued: Option<String>,
}

impl VehicleDetailRecord {
    /// Minimal record for a registration, everything else unknown.
    pub fn new(registration_number: impl Into<String>, make: impl Into<String>) -> Self {
        Self {
            registration_number: registration_number.into(),
            make: make.into(),
            colour: None,
            year_of_manufacture: None,
            month_of_first_registration: None,
            fuel_type: None,
            engine_capacity: None,
            co2_emissions: None,
            euro_status: None,
            real_driving_emissions: None,
            mot_status: None,
            mot_expiry_date: None,
            tax_status: None,
            tax_due_date: None,
            art_end_date: None,
            revenue_weight: None,
            type_approval: None,
            wheelplan: None,
            marked_for_export: false,
            date_of_last_v5c_issued: None,
        }
    }
}
