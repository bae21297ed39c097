use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum VaultTypesError {
    #[error("Malformed file descriptor: {0}")]
    MalformedDescriptor(String),

    #[error("Malformed auth response: {0}")]
    MalformedAuthResponse(String),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VaultTypesError>;
