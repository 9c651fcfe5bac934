use thiserror::Error;

/// The primary error type of the client.
///
/// Navigation surfaces these inline; actions turn them into a blocking alert.
/// Nothing here is retried automatically.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Transport { status: u16, message: String },
    /// No response at all (connect failure, reset, timeout).
    #[error("network error: {0}")]
    Network(String),
    /// The fetch target does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Empty or malformed user input.
    #[error("validation error on field '{field}': {message}")]
    Validation { field: String, message: String },
    /// The folder picker was confirmed without a candidate.
    #[error("no destination folder selected")]
    NoSelection,
    /// Copy/move could not read the source node.
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[source] Box<ClientError>),
    /// Copy/move could not read the destination listing.
    #[error("destination unavailable: {0}")]
    DestinationUnavailable(#[source] Box<ClientError>),
    /// The copy/move request itself failed.
    #[error("request failed: {0}")]
    RequestFailed(#[source] Box<ClientError>),
    /// A second upload was submitted while one is in flight.
    #[error("an upload is already in progress")]
    UploadInProgress,
    /// A success response whose body could not be decoded where a body is required.
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl ClientError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ClientError::Validation { field: field.to_string(), message: message.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            if status == reqwest::StatusCode::NOT_FOUND {
                return ClientError::NotFound(err.to_string());
            }
            return ClientError::Transport { status: status.as_u16(), message: err.to_string() };
        }
        if err.is_decode() {
            return ClientError::Decode(err.to_string());
        }
        ClientError::Network(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(format!("{}: {}", err.kind(), err))
    }
}

/// A type alias for `Result<T, ClientError>`, used throughout the crate.
pub type ClientResult<T> = Result<T, ClientError>;

/// Converts an `Option` into a `ClientResult` with a `NotFound` error.
pub trait OptionExt<T> {
    fn ok_or_not_found(self, entity: &str) -> ClientResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str) -> ClientResult<T> {
        self.ok_or_else(|| ClientError::NotFound(format!("{} not found", entity)))
    }
}

/// Helpers for validating user input before a request is sent.
pub mod validation {
    use super::*;

    /// Trims a required name and rejects it when empty or containing null
    /// characters.
    pub fn required_name(value: &str, field: &str) -> ClientResult<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ClientError::validation(field, "must not be empty"));
        }
        if trimmed.contains('\0') {
            return Err(ClientError::validation(field, "contains null characters"));
        }
        Ok(trimmed.to_string())
    }

    /// Optional name override: blank input means "not given".
    pub fn optional_name(value: Option<&str>, field: &str) -> ClientResult<Option<String>> {
        match value {
            Some(v) if !v.trim().is_empty() => required_name(v, field).map(Some),
            _ => Ok(None),
        }
    }
}
