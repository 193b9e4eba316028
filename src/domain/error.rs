use serde::ser::SerializeStruct;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(String),
    ConfigError(String),
    /// The request never completed (connection refused, reset, DNS, ...).
    Network(String),
    /// The request exceeded its timeout. Still a network failure, reported apart.
    TimedOut(String),
    Http { status: u16, message: String },
    Decode(String),
    IoError(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal",
            AppError::NotFound(_) => "not_found",
            AppError::ValidationError(_) => "validation",
            AppError::ConfigError(_) => "config",
            AppError::Network(_) => "network",
            AppError::TimedOut(_) => "timeout",
            AppError::Http { .. } => "http",
            AppError::Decode(_) => "decode",
            AppError::IoError(_) => "io",
        }
    }

    /// Errors raised while talking to the backend, as opposed to local ones.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::Network(_) | AppError::TimedOut(_) | AppError::Http { .. } | AppError::Decode(_)
        )
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::TimedOut(msg) => write!(f, "Request timed out: {}", msg),
            AppError::Http { status, message } => write!(f, "HTTP {}: {}", status, message),
            AppError::Decode(msg) => write!(f, "Decode error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

// Serialized as `{ error, kind }` so HTTP consumers get a stable tag next to the message.
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut s = serializer.serialize_struct("AppError", 2)?;
        s.serialize_field("error", &self.to_string())?;
        s.serialize_field("kind", self.kind())?;
        s.end()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| match &err.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid.", field),
                })
            })
            .collect();
        messages.sort();
        AppError::ValidationError(messages.join(" "))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_is_distinguishable() {
        let err = AppError::TimedOut("GET /api/defects".to_string());
        assert!(err.to_string().contains("timed out"));
        assert_eq!(err.kind(), "timeout");
        assert!(err.is_upstream());
    }

    #[test]
    fn http_failure_carries_status() {
        let err = AppError::Http {
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(err.http_status(), Some(503));
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let err = AppError::ValidationError("Actual result is required.".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "validation");
        assert_eq!(
            json["error"],
            "Validation error: Actual result is required."
        );
        assert!(!err.is_upstream());
    }
}
