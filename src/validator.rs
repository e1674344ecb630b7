use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::Client;
use std::path::Path;
use std::time::Duration;

use crate::validation::{ValidationError, ValidationRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Transport for the handwriting check. Returns the raw response body;
/// parsing and shape checks belong to the session controller.
pub trait Validator: Send + Sync {
    fn validate(&self, request: &ValidationRequest) -> Result<String, ValidationError>;
}

/// Photo of the learner's answer sheet, base64-encoded for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload(String);

impl ImagePayload {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(STANDARD.encode(bytes))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            ValidationError::Unavailable(format!("could not read photo {}: {e}", path.display()))
        })?;
        if bytes.is_empty() {
            return Err(ValidationError::Unavailable(format!(
                "photo {} is empty",
                path.display()
            )));
        }
        Ok(Self::from_bytes(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Posts the request as JSON to an HTTP endpoint
pub struct HttpValidator {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpValidator {
    pub fn new(endpoint: String, token: Option<String>) -> Result<Self, ValidationError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ValidationError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Validator for HttpValidator {
    fn validate(&self, request: &ValidationRequest) -> Result<String, ValidationError> {
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .map_err(|e| ValidationError::Unavailable(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;

        if status.is_success() {
            Ok(body)
        } else {
            tracing::warn!(status = status.as_u16(), "validation endpoint returned an error");
            Err(ValidationError::from_status(status.as_u16(), &body))
        }
    }
}

/// Used when no endpoint is configured; every call fails as unavailable.
pub struct UnconfiguredValidator;

impl Validator for UnconfiguredValidator {
    fn validate(&self, _request: &ValidationRequest) -> Result<String, ValidationError> {
        Err(ValidationError::Unavailable(
            "no validation endpoint configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_image_payload_from_bytes() {
        let payload = ImagePayload::from_bytes(b"hello");
        assert_eq!(payload.as_str(), "aGVsbG8=");
    }

    #[test]
    fn test_image_payload_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG fake").unwrap();
        let payload = ImagePayload::from_file(file.path()).unwrap();
        assert_eq!(
            STANDARD.decode(payload.into_inner()).unwrap(),
            b"\x89PNG fake"
        );
    }

    #[test]
    fn test_image_payload_missing_file() {
        assert_matches!(
            ImagePayload::from_file("/definitely/not/here.jpg"),
            Err(ValidationError::Unavailable(_))
        );
    }

    #[test]
    fn test_image_payload_empty_file() {
        let file = NamedTempFile::new().unwrap();
        assert_matches!(
            ImagePayload::from_file(file.path()),
            Err(ValidationError::Unavailable(msg)) if msg.contains("empty")
        );
    }

    #[test]
    fn test_request_serializes_without_ticket() {
        let request = ValidationRequest {
            ticket: 7,
            images: vec!["aW1n".into()],
            words: vec!["cat".into()],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"images": ["aW1n"], "words": ["cat"]})
        );
    }

    #[test]
    fn test_unconfigured_validator_fails() {
        let request = ValidationRequest {
            ticket: 1,
            images: vec![],
            words: vec![],
        };
        assert_matches!(
            UnconfiguredValidator.validate(&request),
            Err(ValidationError::Unavailable(_))
        );
    }

    #[test]
    fn test_unreachable_endpoint_is_unavailable() {
        // port 9 (discard) on localhost is not expected to serve http
        let validator = HttpValidator::new("http://127.0.0.1:9/validate".into(), None).unwrap();
        assert_eq!(validator.endpoint(), "http://127.0.0.1:9/validate");
        let request = ValidationRequest {
            ticket: 1,
            images: vec![],
            words: vec!["cat".into()],
        };
        assert_matches!(
            validator.validate(&request),
            Err(ValidationError::Unavailable(_))
        );
    }
}
