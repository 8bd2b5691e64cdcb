use thiserror::Error;

/// Errors talking to a workflow execution backend
#[derive(Error, Debug)]
pub enum SdkError {
    /// Authentication failed (HTTP 401/403)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Invalid request parameters (HTTP 400/422)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Workflow or run does not exist (HTTP 404)
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// API error with status code (HTTP 4xx/5xx except above)
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Network or connection error
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// JSON parsing or serialization error
    #[error("Parse error: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    /// Generic error for unexpected cases
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SdkError {
    /// Create an authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an API error
    pub fn api_error(status: u16, message: String) -> Self {
        Self::Api { status, message }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status and its body to an error
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 | 422 => Self::invalid_request(body),
            401 | 403 => Self::authentication(body),
            404 => Self::not_found(body),
            _ => Self::api_error(status, body),
        }
    }
}
