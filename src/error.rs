use thiserror::Error;

/// Broad error category, used for exit codes and caller-facing grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad request: file, columns, cadence, horizon.
    Input,
    /// Not enough usable data after cleaning/aggregation.
    DataQuality,
    /// The baseline model could not be fitted.
    Model,
    /// Configuration or local I/O problems.
    Environment,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("File must have one of these extensions: .csv, .xlsx, .xls (got '{0}')")]
    UnsupportedFile(String),

    #[error("File size exceeds 10MB limit. Got {size_mb:.1}MB")]
    FileTooLarge { size_mb: f64 },

    #[error("Failed to read file: {0}")]
    FileRead(String),

    #[error("Frequency must be 'D', 'W', or 'M' (got '{0}')")]
    InvalidCadence(String),

    #[error("Horizon must be between 1 and 365 (got {0})")]
    InvalidHorizon(i64),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{role} column '{column}' not found in data")]
    ColumnNotFound { role: &'static str, column: String },

    #[error("No valid data remaining after cleaning")]
    EmptyAfterCleaning,

    #[error("Insufficient data: need at least {required} periods, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Model training failed: {0}")]
    ModelTraining(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV write error: {0}")]
    CsvWrite(#[from] csv::Error),
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::UnsupportedFile(_)
            | AppError::FileTooLarge { .. }
            | AppError::FileRead(_)
            | AppError::InvalidCadence(_)
            | AppError::InvalidHorizon(_)
            | AppError::InvalidInput(_)
            | AppError::ColumnNotFound { .. } => ErrorCategory::Input,
            AppError::EmptyAfterCleaning | AppError::InsufficientData { .. } => ErrorCategory::DataQuality,
            AppError::ModelTraining(_) => ErrorCategory::Model,
            AppError::Config(_) | AppError::Io(_) | AppError::Serialization(_) | AppError::CsvWrite(_) => {
                ErrorCategory::Environment
            }
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::Input => 2,
            ErrorCategory::DataQuality => 3,
            ErrorCategory::Model => 4,
            ErrorCategory::Environment => 5,
        }
    }
}
