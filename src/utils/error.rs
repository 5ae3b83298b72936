use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinderError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid model: {reason}")]
    InvalidModel { reason: String },

    #[error("Invalid value for property '{property}': {reason}")]
    InvalidValue { property: String, reason: String },

    #[error("Invalid property name '{name}': {reason}")]
    InvalidPropertyName { name: String, reason: String },

    #[error("Invalid session id '{id}': {reason}")]
    InvalidSessionId { id: String, reason: String },

    #[error("Calculated property '{property}' would depend on itself: {}", cycle.join(" -> "))]
    DependencyCycle { property: String, cycle: Vec<String> },

    #[error("Unknown event '{name}' for session '{session}'")]
    UnknownEvent { name: String, session: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Model,
    Binding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BinderError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BinderError::IoError(_) => ErrorCategory::Io,
            BinderError::SerializationError(_)
            | BinderError::ConfigError { .. }
            | BinderError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            BinderError::InvalidModel { .. }
            | BinderError::InvalidValue { .. }
            | BinderError::InvalidPropertyName { .. } => ErrorCategory::Model,
            BinderError::InvalidSessionId { .. }
            | BinderError::DependencyCycle { .. }
            | BinderError::UnknownEvent { .. } => ErrorCategory::Binding,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BinderError::UnknownEvent { .. } => ErrorSeverity::Low,
            BinderError::InvalidValue { .. } | BinderError::DependencyCycle { .. } => {
                ErrorSeverity::Medium
            }
            BinderError::InvalidModel { .. }
            | BinderError::InvalidPropertyName { .. }
            | BinderError::InvalidSessionId { .. }
            | BinderError::ConfigError { .. }
            | BinderError::ConfigValidationError { .. }
            | BinderError::SerializationError(_) => ErrorSeverity::High,
            BinderError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BinderError::IoError(_) => "Check that the file exists and is readable".to_string(),
            BinderError::SerializationError(_) => {
                "Make sure the model file contains valid JSON".to_string()
            }
            BinderError::ConfigError { .. } | BinderError::ConfigValidationError { .. } => {
                "Review the configuration file against the documented sections".to_string()
            }
            BinderError::InvalidModel { .. } => {
                "Provide the model as a flat object of name/value pairs".to_string()
            }
            BinderError::InvalidValue { .. } => {
                "Use strings, numbers, booleans or null as property values".to_string()
            }
            BinderError::InvalidPropertyName { .. } => {
                "Use non-empty property names without whitespace, quotes or braces".to_string()
            }
            BinderError::InvalidSessionId { .. } => {
                "Use a non-empty session id without whitespace or ':'".to_string()
            }
            BinderError::DependencyCycle { property, .. } => format!(
                "Remove the reference chain that leads back to '{}'",
                property
            ),
            BinderError::UnknownEvent { session, .. } => format!(
                "Subscribe to '{0}:change' or '{0}:updated'",
                session
            ),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("Could not read input: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Model => format!("The model could not be bound: {}", self),
            ErrorCategory::Binding => format!("Binding failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, BinderError>;
