use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Empty or invalid input to a fitting stage
    #[error("Data error: {0}")]
    Data(String),

    /// Degenerate label set or a failed model fit
    #[error("Training error: {0}")]
    Training(String),

    /// A required model artifact is absent or unreadable
    #[error("Missing model artifact '{artifact}': {message}")]
    MissingArtifact { artifact: String, message: String },

    /// Decode of a label code outside the fitted range
    #[error("Unknown label code: {0}")]
    UnknownCode(usize),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Construct a missing-artifact error naming the absent piece.
    pub fn missing_artifact(artifact: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::MissingArtifact {
            artifact: artifact.into(),
            message: message.into(),
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Data(_) => "DATA_ERROR",
            AppError::Training(_) => "TRAINING_ERROR",
            AppError::MissingArtifact { .. } => "MISSING_ARTIFACT",
            AppError::UnknownCode(_) => "UNKNOWN_CODE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from bincode::Error
impl From<bincode::Error> for AppError {
    fn from(err: bincode::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
