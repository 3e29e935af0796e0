use thiserror::Error;

/// Failures of the local record store. Each names the key involved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Could not access saved data ({key}): {message}")]
    Io { key: String, message: String },

    #[error("Saved data is unreadable ({key}): {message}")]
    Serialization { key: String, message: String },
}

impl StoreError {
    pub fn io(key: &str, err: impl std::fmt::Display) -> Self {
        StoreError::Io {
            key: key.to_string(),
            message: err.to_string(),
        }
    }

    pub fn serialization(key: &str, err: impl std::fmt::Display) -> Self {
        StoreError::Serialization {
            key: key.to_string(),
            message: err.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            StoreError::Io { key, .. } | StoreError::Serialization { key, .. } => key,
        }
    }
}
