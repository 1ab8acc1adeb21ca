//! Error types for the i2r-platform crate.
//!
//! The platform reports failures as a JSON envelope carrying a correlation
//! id and a list of `{code, level, message}` entries. [`ErrorEnvelope`]
//! decodes that body; [`PlatformError`] wraps it together with transport
//! and decoding failures.

use serde::{Deserialize, Serialize};

/// One entry of an error envelope's `responseMessages`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Error code.
    #[serde(default)]
    pub code: String,
    /// Severity.
    #[serde(default)]
    pub level: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

/// The body of a non-2xx platform response.
///
/// # Examples
///
/// ```
/// use i2r_platform::ErrorEnvelope;
///
/// let body = r#"{
///     "correlationId": "abc",
///     "responseMessages": [{"code": "INVALID_REQUEST", "level": "ERROR",
///                           "message": "Service web is already remote"}]
/// }"#;
/// let envelope = ErrorEnvelope::from_body(body);
/// assert!(envelope.reports_already_remote());
/// assert!(envelope.joined().contains("abc"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Response status string (`ERROR`, `FAILURE`).
    #[serde(default)]
    pub status: Option<String>,
    /// Top-level error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Top-level message.
    #[serde(default)]
    pub message: Option<String>,
    /// Support correlation identifier.
    #[serde(default)]
    pub correlation_id: Option<String>,
    /// Detailed messages.
    #[serde(default)]
    pub response_messages: Vec<ResponseMessage>,
}

impl ErrorEnvelope {
    /// Decodes a response body, falling back to the raw text as the message.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self {
            message: Some(body.trim().to_owned()).filter(|m| !m.is_empty()),
            ..Self::default()
        })
    }

    /// Creates an envelope with a single message, as the platform does for
    /// most validation failures.
    #[must_use]
    pub fn single(code: &str, message: &str) -> Self {
        Self {
            status: Some("ERROR".to_owned()),
            code: Some(code.to_owned()),
            message: Some(message.to_owned()),
            correlation_id: None,
            response_messages: vec![ResponseMessage {
                code: code.to_owned(),
                level: "ERROR".to_owned(),
                message: message.to_owned(),
            }],
        }
    }

    /// Joins all messages into one line.
    #[must_use]
    pub fn joined(&self) -> String {
        let mut text = if self.response_messages.is_empty() {
            self.message.clone().unwrap_or_default()
        } else {
            self.response_messages
                .iter()
                .map(|m| format!("[{}] {}: {}", m.level, m.code, m.message))
                .collect::<Vec<_>>()
                .join("; ")
        };
        if let Some(id) = self.correlation_id.as_deref().filter(|id| !id.is_empty()) {
            text.push_str(&format!(" (correlation id {id})"));
        }
        text
    }

    /// Returns `true` if the envelope says the entity is already remote.
    ///
    /// Only an envelope with exactly one message qualifies.
    #[must_use]
    pub fn reports_already_remote(&self) -> bool {
        matches!(
            self.response_messages.as_slice(),
            [only] if only.message.contains("is already remote")
        )
    }
}

/// Errors returned by [`PlatformApi`](crate::PlatformApi) implementations.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The request could not be sent or the response could not be read.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        /// The endpoint path.
        endpoint: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The platform answered with a non-2xx status.
    #[error("{endpoint} returned {status}: {}", envelope.joined())]
    Api {
        /// The endpoint path.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// The decoded error body.
        envelope: ErrorEnvelope,
    },

    /// A 2xx response body did not have the expected shape.
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        /// The endpoint path.
        endpoint: String,
        /// The decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// A connector lookup returned no connector.
    #[error("connector '{0}' not found or invalid")]
    InvalidConnector(String),
}

impl PlatformError {
    /// Creates a new [`PlatformError::Api`] error.
    #[must_use]
    pub fn api(endpoint: impl Into<String>, status: u16, envelope: ErrorEnvelope) -> Self {
        Self::Api {
            endpoint: endpoint.into(),
            status,
            envelope,
        }
    }

    /// Returns the error envelope, if the platform sent one.
    #[must_use]
    pub fn envelope(&self) -> Option<&ErrorEnvelope> {
        match self {
            Self::Api { envelope, .. } => Some(envelope),
            _ => None,
        }
    }

    /// Returns `true` if the platform rejected the call because the entity
    /// is already remote.
    #[must_use]
    pub fn is_already_remote(&self) -> bool {
        self.envelope()
            .is_some_and(ErrorEnvelope::reports_already_remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> ResponseMessage {
        ResponseMessage {
            code: "INVALID_REQUEST".to_owned(),
            level: "ERROR".to_owned(),
            message: text.to_owned(),
        }
    }

    #[test]
    fn test_already_remote_requires_exactly_one_message() {
        let mut envelope = ErrorEnvelope {
            response_messages: vec![message("Service [web] is already remote")],
            ..ErrorEnvelope::default()
        };
        assert!(envelope.reports_already_remote());

        envelope.response_messages.push(message("something else"));
        assert!(!envelope.reports_already_remote());

        envelope.response_messages.clear();
        assert!(!envelope.reports_already_remote());
    }

    #[test]
    fn test_already_remote_substring_must_match() {
        let envelope = ErrorEnvelope {
            response_messages: vec![message("Service [web] is remote")],
            ..ErrorEnvelope::default()
        };
        assert!(!envelope.reports_already_remote());
    }

    #[test]
    fn test_joined_includes_all_messages_and_correlation() {
        let envelope = ErrorEnvelope {
            correlation_id: Some("c-1".to_owned()),
            response_messages: vec![message("first"), message("second")],
            ..ErrorEnvelope::default()
        };
        assert_eq!(
            envelope.joined(),
            "[ERROR] INVALID_REQUEST: first; [ERROR] INVALID_REQUEST: second (correlation id c-1)"
        );
    }

    #[test]
    fn test_from_body_falls_back_to_text() {
        let envelope = ErrorEnvelope::from_body("<html>Bad Gateway</html>");
        assert_eq!(envelope.joined(), "<html>Bad Gateway</html>");
        assert!(ErrorEnvelope::from_body("").joined().is_empty());
    }

    #[test]
    fn test_api_error_display_and_classification() {
        let err = PlatformError::api(
            "/gateway/ng/api/servicesV2/move-config/web",
            400,
            ErrorEnvelope::single("INVALID_REQUEST", "Service web is already remote"),
        );
        assert!(err.is_already_remote());
        assert!(err.to_string().contains("returned 400"));
        assert!(!PlatformError::InvalidConnector("x".to_owned()).is_already_remote());
    }
}
