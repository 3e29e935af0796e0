use thiserror::Error;

use crate::api::LookupError;
use crate::store::StoreError;

/// Errors surfaced by garage operations. `Display` is the user-visible message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GarageError {
    #[error("Please enter a registration number.")]
    EmptyRegistration,

    #[error("{0} is already in your garage.")]
    DuplicateRegistration(String),

    #[error("Invalid registration number")]
    MissingRegistration,

    #[error("Not a supported image file: {0}")]
    UnsupportedImage(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, GarageError>;
