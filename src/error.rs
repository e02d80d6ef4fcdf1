use thiserror::Error;

/// Errors raised while normalising an identity service response.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Response body carries neither a `token` nor an `access` envelope
    #[error("unrecognized auth response")]
    UnrecognizedFormat,

    /// A field the detected schema requires is missing or has the wrong type
    #[error("malformed token: required field '{field}' is missing or invalid")]
    MalformedToken { field: String },

    #[error("invalid timestamp in '{field}': '{value}'")]
    InvalidTimestamp { field: String, value: String },

    #[error("response body is not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("the service catalog is empty")]
    EmptyCatalog,

    #[error("{0}")]
    EndpointNotFound(String),
}

impl AccessError {
    pub(crate) fn malformed(path: &[&str]) -> Self {
        AccessError::MalformedToken { field: path.join(".") }
    }
}

pub type Result<T> = std::result::Result<T, AccessError>;
