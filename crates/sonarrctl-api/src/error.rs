//! Error taxonomy for Sonarr API calls.

use serde_json::Value;
use thiserror::Error;

/// Result alias for Sonarr API calls.
pub type Result<T> = std::result::Result<T, SonarrError>;

/// A failed Sonarr API call. Exactly one is produced per failed call.
#[derive(Debug, Clone, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum SonarrError {
    /// Transport failure, timeout, undecodable body, or an unclassified status.
    #[error("failed to connect to Sonarr at {host}:{port}: {message}")]
    Connection {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
        /// Underlying failure.
        message: String,
    },

    /// HTTP 401: the API key is missing or invalid.
    #[error("Sonarr rejected the API key (HTTP 401)")]
    Authentication,

    /// HTTP 404.
    #[error("Sonarr resource not found: {path}")]
    NotFound {
        /// Rendered resource path.
        path: String,
    },

    /// HTTP 400 or 422 with the field-level error detail.
    #[error("Sonarr rejected the request: {body}")]
    Validation {
        /// Parsed response body (`null` when it was not JSON).
        body: Value,
    },

    /// The fake client has no response registered for a call.
    #[error("no fake response registered for {key:?}")]
    UnregisteredResponse {
        /// Most specific lookup key tried.
        key: String,
    },

    /// A successful response did not have the expected shape.
    #[error("unexpected Sonarr response: {0}")]
    UnexpectedResponse(String),
}

impl SonarrError {
    /// Builds a `Connection` error.
    #[must_use]
    pub fn connection(host: impl Into<String>, port: u16, message: impl Into<String>) -> Self {
        Self::Connection {
            host: host.into(),
            port,
            message: message.into(),
        }
    }

    /// Field-level validation messages (`errors[].message` or a top-level array).
    #[must_use]
    pub fn validation_messages(&self) -> Vec<String> {
        let Self::Validation { body } = self else {
            return Vec::new();
        };
        let items: &[Value] = match body {
            Value::Array(items) => items.as_slice(),
            Value::Object(map) => map
                .get("errors")
                .and_then(Value::as_array)
                .map_or(&[][..], Vec::as_slice),
            _ => &[],
        };
        items
            .iter()
            .filter_map(|item| {
                let message = item
                    .get("message")
                    .or_else(|| item.get("errorMessage"))
                    .and_then(Value::as_str)?;
                let field = item
                    .get("field")
                    .or_else(|| item.get("propertyName"))
                    .and_then(Value::as_str);
                Some(field.map_or_else(|| String::from(message), |f| format!("{f}: {message}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_connection_display_includes_host_and_port() {
        // Arrange
        let err = SonarrError::connection("sonarr.lan", 8989, "connection refused");

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("sonarr.lan:8989"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_validation_messages_from_errors_object() {
        // Arrange
        let err = SonarrError::Validation {
            body: json!({"errors": [{"field": "title", "message": "required"}]}),
        };

        // Act & Assert
        assert_eq!(err.validation_messages(), vec!["title: required"]);
    }

    #[test]
    fn test_validation_messages_from_sonarr_array() {
        // Arrange
        let err = SonarrError::Validation {
            body: json!([
                {"propertyName": "Path", "errorMessage": "Path is already configured"},
                {"errorMessage": "Invalid"}
            ]),
        };

        // Act & Assert
        assert_eq!(
            err.validation_messages(),
            vec!["Path: Path is already configured", "Invalid"]
        );
    }

    #[test]
    fn test_validation_messages_other_variants_empty() {
        assert!(SonarrError::Authentication.validation_messages().is_empty());
    }
}
