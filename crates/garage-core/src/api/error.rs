use serde::Deserialize;
use thiserror::Error;

const GENERIC_MESSAGE: &str = "An error occurred while fetching vehicle details.";

/// Failures of a vehicle lookup. `Display` is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Invalid registration number format. Please check and try again.")]
    InvalidFormat,

    #[error("Vehicle not found. Please check the registration number.")]
    NotFound,

    #[error("DVLA service is experiencing technical difficulties. Please try again later.")]
    ProviderError,

    #[error("DVLA service is currently unavailable. Please try again later.")]
    ProviderUnavailable,

    #[error("Unable to connect to the DVLA service. Please check your internet connection and try again.")]
    NetworkUnreachable,

    #[error("{0}")]
    Unknown(String),
}

/// Error body sent by the provider: `{ "errors": [{ "status": "404", ... }] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub errors: Vec<ProviderError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderError {
    pub status: String,
    #[serde(default)]
    pub detail: Option<String>,
}

impl LookupError {
    /// Generic failure with the default message.
    pub fn unknown() -> Self {
        LookupError::Unknown(GENERIC_MESSAGE.to_string())
    }

    /// Map a transport-level HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => LookupError::InvalidFormat,
            404 => LookupError::NotFound,
            500 => LookupError::ProviderError,
            503 => LookupError::ProviderUnavailable,
            _ => LookupError::unknown(),
        }
    }

    /// Map the first entry of a provider error envelope.
    pub fn from_envelope(envelope: &ErrorEnvelope) -> Self {
        let Some(first) = envelope.errors.first() else {
            return LookupError::unknown();
        };
        match first.status.trim() {
            "400" => LookupError::InvalidFormat,
            "404" => LookupError::NotFound,
            "500" => LookupError::ProviderError,
            "503" => LookupError::ProviderUnavailable,
            _ => match first.detail.as_deref().map(str::trim) {
                Some(detail) if !detail.is_empty() => LookupError::Unknown(detail.to_string()),
                _ => LookupError::unknown(),
            },
        }
    }

    /// Map a reqwest failure that happened before any response arrived.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            LookupError::NetworkUnreachable
        } else {
            LookupError::unknown()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(status: &str, detail: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            errors: vec![ProviderError {
                status: status.to_string(),
                detail: detail.map(str::to_string),
            }],
        }
    }

    #[test]
    fn test_from_status() {
        assert_eq!(LookupError::from_status(400), LookupError::InvalidFormat);
        assert_eq!(LookupError::from_status(404), LookupError::NotFound);
        assert_eq!(LookupError::from_status(500), LookupError::ProviderError);
        assert_eq!(LookupError::from_status(503), LookupError::ProviderUnavailable);
        assert_eq!(LookupError::from_status(429), LookupError::unknown());
        assert_eq!(LookupError::from_status(502), LookupError::unknown());
    }

    #[test]
    fn test_from_envelope() {
        assert_eq!(LookupError::from_envelope(&envelope("400", None)), LookupError::InvalidFormat);
        assert_eq!(LookupError::from_envelope(&envelope("404", Some("x"))), LookupError::NotFound);
        assert_eq!(LookupError::from_envelope(&envelope("500", None)), LookupError::ProviderError);
        assert_eq!(
            LookupError::from_envelope(&envelope("503", None)),
            LookupError::ProviderUnavailable
        );
    }

    #[test]
    fn test_from_envelope_unknown_uses_detail() {
        assert_eq!(
            LookupError::from_envelope(&envelope("403", Some("Forbidden: missing API key"))),
            LookupError::Unknown("Forbidden: missing API key".to_string())
        );
        assert_eq!(LookupError::from_envelope(&envelope("403", Some("  "))), LookupError::unknown());
        assert_eq!(
            LookupError::from_envelope(&ErrorEnvelope { errors: vec![] }),
            LookupError::unknown()
        );
    }

    #[test]
    fn test_every_error_has_a_message() {
        let all = [
            LookupError::InvalidFormat,
            LookupError::NotFound,
            LookupError::ProviderError,
            LookupError::ProviderUnavailable,
            LookupError::NetworkUnreachable,
            LookupError::unknown(),
        ];
        for err in all {
            assert!(!err.to_string().is_empty());
        }
    }
}
