use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Remote API error {code}: {message}")]
    RemoteApiError { code: i64, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Reactor fetch failed for post {post_id} ({kind}): {reason}")]
    ReactorFetchError {
        post_id: i64,
        kind: String,
        reason: String,
    },

    #[error("Invalid date '{value}': expected DD.MM.YYYY")]
    InvalidDateError { value: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Remote,
    Storage,
    Data,
    Input,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::RemoteApiError { .. }
            | EtlError::NotFound { .. }
            | EtlError::ReactorFetchError { .. } => ErrorCategory::Remote,
            EtlError::ZipError(_) | EtlError::IoError(_) => ErrorCategory::Storage,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::InvalidDateError { .. } => ErrorCategory::Input,
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Remote => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// 是否值得稍後重試（本身不做重試）
    pub fn is_transient(&self) -> bool {
        matches!(self.category(), ErrorCategory::Network)
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ApiError(e) if e.is_timeout() => {
                "The social network API did not answer in time".to_string()
            }
            EtlError::ApiError(_) => "Could not reach the social network API".to_string(),
            EtlError::RemoteApiError { code, message } => {
                format!("The API rejected the request (code {}): {}", code, message)
            }
            EtlError::NotFound { what } => format!("Nothing found for {}", what),
            EtlError::InvalidDateError { value } => {
                format!("'{}' is not a date, use DD.MM.YYYY", value)
            }
            EtlError::ConfigValidationError { field, .. }
            | EtlError::InvalidConfigValueError { field, .. }
            | EtlError::MissingConfigError { field } => {
                format!("Configuration problem in '{}'", field)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the network connection and try again later",
            ErrorCategory::Remote => "Check the access token and the community / roster names",
            ErrorCategory::Storage => "Check that the output directory exists and is writable",
            ErrorCategory::Data => "The API answered with unexpected data; run with --verbose",
            ErrorCategory::Input => "Fix the command input and run it again",
            ErrorCategory::Configuration => "Fix the configuration file and restart",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
