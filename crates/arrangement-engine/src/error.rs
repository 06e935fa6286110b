//! Error types for arrangement-engine operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Generic user-facing message for every API failure except "not found".
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Uventet feil";

/// Malformed temporal input. Indicates corrupt upstream data, never user error.
#[derive(Error, Debug)]
pub enum TemporalError {
    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

/// Failure talking to the backend event API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Event not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }

    /// Message the rendering layer shows; `None` means render the not-found page.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            ApiError::NotFound => None,
            _ => Some(UNEXPECTED_ERROR_MESSAGE),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Not authenticated; log in and return to {return_path}")]
    Unauthenticated { return_path: String },
}

pub type Result<T> = std::result::Result<T, TemporalError>;
