//! Client-side error classification

use crate::error::{ErrorResponse, FieldError};
use std::fmt;

/// Errors surfaced by the REST client and the mutation layer
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Non-2xx response from the registry
    Http {
        status: u16,
        message: String,
        details: Vec<FieldError>,
    },
    /// Transport failure (timeout, DNS, refused connection)
    Network(String),
    /// The response body did not match the expected shape
    Decode(String),
    /// The same mutation control is already running
    Pending,
}

impl ClientError {
    /// Parse an error response. The `{error, details}` body is preferred;
    /// anything else is carried through as text.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(parsed) => ClientError::Http {
                status,
                message: parsed.error,
                details: parsed.details,
            },
            Err(_) => {
                let text = body.trim();
                ClientError::Http {
                    status,
                    message: if text.is_empty() {
                        format!("Request failed with status {}", status)
                    } else {
                        text.to_string()
                    },
                    details: Vec::new(),
                }
            }
        }
    }

    /// Parse a network/reqwest error
    pub fn from_network_error(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ClientError::Network("Connection failed".to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Human-readable message for a toast
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http {
                message, details, ..
            } if !details.is_empty() => {
                let fields: Vec<String> = details
                    .iter()
                    .map(|d| format!("{}: {}", d.field, d.message))
                    .collect();
                format!("{} ({})", message, fields.join(", "))
            }
            ClientError::Http { message, .. } => message.clone(),
            ClientError::Network(msg) => {
                format!("Network error: {}. Please check your connection.", msg)
            }
            ClientError::Decode(msg) => format!("Unexpected response from server: {}", msg),
            ClientError::Pending => "This action is already in progress.".to_string(),
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Http { status, .. } => write!(f, "{}: {}", status, self.user_message()),
            _ => write!(f, "{}", self.user_message()),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_body() {
        let err = ClientError::from_response(
            400,
            r#"{"error":"Invalid request data","details":[{"field":"title","message":"Required"}]}"#,
        );
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.user_message(), "Invalid request data (title: Required)");
    }

    #[test]
    fn test_plain_text_body() {
        let err = ClientError::from_response(502, "Bad Gateway");
        assert_eq!(err.user_message(), "Bad Gateway");
        assert_eq!(err.to_string(), "502: Bad Gateway");

        let empty = ClientError::from_response(500, "");
        assert_eq!(empty.user_message(), "Request failed with status 500");
    }

    #[test]
    fn test_not_found() {
        let err = ClientError::from_response(404, r#"{"error":"Market not found"}"#);
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), "Market not found");
    }
}
