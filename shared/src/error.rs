use lambda_http::http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Failure of a call to the identity provider or the role table.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("request to backend failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("unexpected backend response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}

/// Outcome of a request that did not succeed, as seen by the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProvisioningError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    /// Detail is logged, never returned to the caller.
    #[error("Internal server error")]
    Internal(String),
}

impl ProvisioningError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ProviderError> for ProvisioningError {
    fn from(err: ProviderError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

// GoTrue uses `msg`, PostgREST uses `message`, OAuth style errors use the other two
#[derive(Deserialize, Default)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Pull a human readable message out of a Supabase error body.
pub fn provider_message(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .msg
        .or(parsed.message)
        .or(parsed.error_description)
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(|reason| reason.to_string())
                .unwrap_or_else(|| format!("backend returned status {}", status.as_u16()))
        })
}
