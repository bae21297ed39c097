use reqwest::StatusCode;
use thiserror::Error;
use vault_types::VaultTypesError;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum VaultClientError {
    #[error("Configuration Error: {0}")]
    ConfigurationError(String),

    #[error("Credential Error: {0}")]
    CredentialError(#[source] anyhow::Error),

    #[error("Parse Error: {0}")]
    ParseError(#[from] url::ParseError),

    #[error("ReqwestMiddleware Error: {0}")]
    ReqwestMiddlewareError(#[from] reqwest_middleware::Error),

    #[error("Reqwest Error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Request failed ({status}): {message}")]
    StatusError { status: StatusCode, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] VaultTypesError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl VaultClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            VaultClientError::StatusError { status, .. } => Some(*status),
            VaultClientError::Upload(UploadError::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VaultClientError>;

/// Why a single file upload did not produce a record.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UploadError {
    /// No response was received: connect failure, DNS, timeout or a dropped connection.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("Upload rejected ({status}): {detail}")]
    Rejected { status: StatusCode, detail: String },

    /// The server accepted the file but its response could not be turned into a record.
    #[error("Malformed upload response: {0}")]
    MalformedResponse(String),

    /// The request could not be built, e.g. an unusable MIME type or credential.
    #[error("Upload could not be started: {0}")]
    Setup(String),
}

impl UploadError {
    /// Builds the rejection for a non-success response from its optional `{message}` body.
    /// The detail falls back to the status reason phrase and then to a generic message.
    pub fn rejected(status: StatusCode, message: Option<String>) -> Self {
        let detail = message
            .filter(|m| !m.trim().is_empty())
            .or_else(|| status.canonical_reason().map(str::to_owned))
            .unwrap_or_else(|| "Upload failed".to_owned());
        UploadError::Rejected { status, detail }
    }

    /// Human-readable detail recorded on a failed session.
    pub fn error_detail(&self) -> String {
        match self {
            UploadError::Network(_) => "Network error".to_owned(),
            UploadError::Rejected { detail, .. } => detail.clone(),
            UploadError::MalformedResponse(reason) => format!("Malformed upload response: {reason}"),
            UploadError::Setup(reason) => reason.clone(),
        }
    }
}

impl From<VaultTypesError> for UploadError {
    fn from(value: VaultTypesError) -> Self {
        UploadError::MalformedResponse(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail() {
        assert_eq!(UploadError::Network("connection refused".into()).error_detail(), "Network error");
        assert_eq!(
            UploadError::rejected(StatusCode::UNAUTHORIZED, Some("Token is missing!".into())).error_detail(),
            "Token is missing!"
        );
        assert_eq!(UploadError::rejected(StatusCode::UNAUTHORIZED, None).error_detail(), "Unauthorized");
        assert_eq!(UploadError::rejected(StatusCode::BAD_GATEWAY, Some("  ".into())).error_detail(), "Bad Gateway");

        let unknown = StatusCode::from_u16(599).unwrap();
        assert_eq!(UploadError::rejected(unknown, None).error_detail(), "Upload failed");

        assert_eq!(
            UploadError::MalformedResponse("missing field `id`".into()).error_detail(),
            "Malformed upload response: missing field `id`"
        );
    }

    #[test]
    fn test_status_accessor() {
        let err = VaultClientError::from(UploadError::rejected(StatusCode::FORBIDDEN, None));
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(VaultClientError::ConfigurationError("x".into()).status(), None);
    }
}
