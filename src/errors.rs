use thiserror::Error;

use crate::storage::BackendKind;

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Storage error ({backend}): {message}")]
    Storage {
        backend: BackendKind,
        message: String,
    },

    #[error("Failed to send HTTP request: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Rejections raised by the upload gateway, checked in declaration order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("No file provided")]
    MissingFile,

    #[error("Invalid file type. Only PNG, SVG, JPEG, JPG are allowed.")]
    UnsupportedType(String),

    #[error("File size exceeds 5MB limit")]
    FileTooLarge(usize),
}

impl PortfolioError {
    pub fn storage(backend: BackendKind, message: impl Into<String>) -> Self {
        PortfolioError::Storage {
            backend,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            PortfolioError::Unauthorized => 401,
            PortfolioError::Validation(_) | PortfolioError::Upload(_) => 400,
            PortfolioError::Storage { .. }
            | PortfolioError::Http(_)
            | PortfolioError::Config(_) => 500,
        }
    }
}

impl From<reqwest::Error> for PortfolioError {
    fn from(error: reqwest::Error) -> Self {
        PortfolioError::Http(error.to_string())
    }
}

impl From<serde_json::Error> for PortfolioError {
    fn from(error: serde_json::Error) -> Self {
        PortfolioError::Validation(error.to_string())
    }
}
