//! HTTP client for the DVLA Vehicle Enquiry Service.
//!
//! A single request type is issued: `POST { "registrationNumber": ... }` to
//! the configured endpoint. The response is either a vehicle record or an
//! error envelope; both, plus the HTTP status, are folded into `LookupError`.

use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::VehicleDetailRecord;

use super::{ErrorEnvelope, LookupError, VehicleLookup};

// ============================================================================
// Constants
// ============================================================================

/// Header the provider reads the API key from
const API_KEY_HEADER: &str = "x-api-key";

/// Maximum length for response bodies quoted in log lines
const MAX_LOGGED_BODY_LENGTH: usize = 500;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnquiryRequest<'a> {
    registration_number: &'a str,
}

/// Vehicle enquiry client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: String,
}

impl ApiClient {
    /// Create a client for `endpoint`, sending `api_key` on every request when given.
    pub fn new(endpoint: impl Into<String>, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let mut value = header::HeaderValue::from_str(key)?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Create a client from the endpoint, key and timeout in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.endpoint(),
            config.api_key.as_deref(),
            Duration::from_secs(config.request_timeout_secs()),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post_enquiry(&self, registration_number: &str) -> Result<VehicleDetailRecord, LookupError> {
        debug!(registration = %registration_number, "Requesting vehicle details");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&EnquiryRequest { registration_number })
            .send()
            .await
            .map_err(|e| {
                warn!(registration = %registration_number, error = %e, "Vehicle enquiry request failed");
                LookupError::from_transport(&e)
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| LookupError::from_transport(&e))?;

        Self::interpret_response(status, &body)
    }

    /// Turn a status and body into a record or a mapped error.
    /// A provider error envelope wins over the HTTP status.
    fn interpret_response(status: u16, body: &str) -> Result<VehicleDetailRecord, LookupError> {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
            let err = LookupError::from_envelope(&envelope);
            debug!(status, error = %err, "Provider returned an error envelope");
            return Err(err);
        }

        if !(200..300).contains(&status) {
            debug!(status, body = %truncate_body(body), "Vehicle enquiry returned an error status");
            return Err(LookupError::from_status(status));
        }

        serde_json::from_str(body).map_err(|e| {
            warn!(error = %e, body = %truncate_body(body), "Failed to parse vehicle record");
            LookupError::unknown()
        })
    }
}

impl VehicleLookup for ApiClient {
    async fn fetch_details(&self, registration_number: &str) -> Result<VehicleDetailRecord, LookupError> {
        self.post_enquiry(registration_number).await
    }
}

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_LOGGED_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_LOGGED_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpret_success() {
        let body = r#"{"registrationNumber": "SW03PER", "make": "FORD", "colour": "RED", "markedForExport": false}"#;
        let record = ApiClient::interpret_response(200, body).expect("record should parse");
        assert_eq!(record.registration_number, "SW03PER");
        assert_eq!(record.colour.as_deref(), Some("RED"));
    }

    #[test]
    fn test_interpret_status_codes() {
        assert_eq!(ApiClient::interpret_response(400, ""), Err(LookupError::InvalidFormat));
        assert_eq!(ApiClient::interpret_response(404, "Not Found"), Err(LookupError::NotFound));
        assert_eq!(ApiClient::interpret_response(500, "<html>"), Err(LookupError::ProviderError));
        assert_eq!(ApiClient::interpret_response(503, ""), Err(LookupError::ProviderUnavailable));
        assert_eq!(ApiClient::interpret_response(418, ""), Err(LookupError::unknown()));
    }

    #[test]
    fn test_envelope_takes_precedence_over_status() {
        let body = r#"{"errors": [{"status": "404", "code": "404", "title": "Vehicle Not Found"}]}"#;
        assert_eq!(ApiClient::interpret_response(400, body), Err(LookupError::NotFound));

        let body = r#"{"errors": [{"status": "403", "detail": "Missing Authentication Token"}]}"#;
        assert_eq!(
            ApiClient::interpret_response(403, body),
            Err(LookupError::Unknown("Missing Authentication Token".to_string()))
        );
    }

    #[test]
    fn test_unparseable_success_body() {
        assert_eq!(ApiClient::interpret_response(200, "<html>ok</html>"), Err(LookupError::unknown()));
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short"), "short");
        let long = "é".repeat(400);
        let truncated = truncate_body(&long);
        assert!(truncated.contains("truncated, 800 total bytes"));
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_network_unreachable() {
        let client = ApiClient::new("http://127.0.0.1:1/vehicles", None, Duration::from_secs(2))
            .expect("client should build");
        let result = client.fetch_details("SW03PER").await;
        assert_eq!(result, Err(LookupError::NetworkUnreachable));
    }
}
