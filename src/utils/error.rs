use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkError {
    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Registry request failed: {message}")]
    RegistryError { message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

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
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Registry,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl MarkError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn registry(message: impl Into<String>) -> Self {
        Self::RegistryError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            MarkError::ParseError { .. }
            | MarkError::ValidationError { .. }
            | MarkError::CsvError(_) => ErrorCategory::Input,
            MarkError::RegistryError { .. } | MarkError::HttpError(_) => ErrorCategory::Registry,
            MarkError::ConfigError { .. }
            | MarkError::ConfigValidationError { .. }
            | MarkError::InvalidConfigValueError { .. }
            | MarkError::MissingConfigError { .. } => ErrorCategory::Configuration,
            MarkError::IoError(_) | MarkError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Registry => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 外部登記服務失敗 (token、查詢或傳輸層)
    pub fn is_registry_failure(&self) -> bool {
        self.category() == ErrorCategory::Registry
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MarkError::ParseError { message } => format!("Could not parse input: {}", message),
            MarkError::ValidationError { message } => format!("Invalid input: {}", message),
            MarkError::RegistryError { message } => {
                format!("Registry is unavailable: {}", message)
            }
            MarkError::HttpError(e) => format!("Network error while calling registry: {}", e),
            MarkError::MissingConfigError { field } => {
                format!("Configuration value '{}' is required", field)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check that the input is a JSON array of the expected shape",
            ErrorCategory::Registry => {
                "Check registry credentials and network access, then run the command again"
            }
            ErrorCategory::Configuration => "Fix the configuration file or command line flags",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, MarkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_and_severity() {
        assert_eq!(MarkError::parse("bad").category(), ErrorCategory::Input);
        assert_eq!(MarkError::registry("down").severity(), ErrorSeverity::Medium);
        assert!(MarkError::registry("down").is_registry_failure());
        assert!(!MarkError::validation("x").is_registry_failure());

        let missing = MarkError::MissingConfigError {
            field: "registry.username".to_string(),
        };
        assert_eq!(missing.category(), ErrorCategory::Configuration);
        assert_eq!(missing.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_user_friendly_message() {
        let err = MarkError::validation("expected a JSON array");
        assert_eq!(err.user_friendly_message(), "Invalid input: expected a JSON array");
        assert_eq!(err.to_string(), "Validation error: expected a JSON array");
    }
}
