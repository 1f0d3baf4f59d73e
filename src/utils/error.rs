use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Backend request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    BackendError { status: u16, message: String },

    #[error("CSV rendering error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error on {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Sign-in required")]
    Unauthenticated,

    #[error("Not allowed: {message}")]
    Forbidden { message: String },

    #[error("Email '{email}' is not a @{domain} address")]
    InvalidEmailDomain { email: String, domain: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Listing '{id}' is {status} and can no longer change status")]
    IllegalTransition { id: String, status: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Auth,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MarketError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MarketError::ApiError(_) | MarketError::BackendError { .. } => ErrorCategory::Network,
            MarketError::ConfigError { .. }
            | MarketError::InvalidConfigValueError { .. }
            | MarketError::MissingConfigError { .. } => ErrorCategory::Configuration,
            MarketError::CsvError(_)
            | MarketError::IoError(_)
            | MarketError::SerializationError(_)
            | MarketError::ValidationError { .. }
            | MarketError::IllegalTransition { .. } => ErrorCategory::Data,
            MarketError::Unauthenticated
            | MarketError::Forbidden { .. }
            | MarketError::InvalidEmailDomain { .. }
            | MarketError::AuthenticationFailed { .. } => ErrorCategory::Auth,
            MarketError::NotFound { .. } => ErrorCategory::NotFound,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 使用者可自行修正的輸入
            MarketError::NotFound { .. }
            | MarketError::ValidationError { .. }
            | MarketError::InvalidEmailDomain { .. } => ErrorSeverity::Low,
            MarketError::ApiError(_)
            | MarketError::BackendError { .. }
            | MarketError::Unauthenticated
            | MarketError::AuthenticationFailed { .. } => ErrorSeverity::Medium,
            MarketError::Forbidden { .. }
            | MarketError::IllegalTransition { .. }
            | MarketError::CsvError(_)
            | MarketError::SerializationError(_) => ErrorSeverity::High,
            MarketError::IoError(_)
            | MarketError::ConfigError { .. }
            | MarketError::InvalidConfigValueError { .. }
            | MarketError::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MarketError::ApiError(_) | MarketError::BackendError { .. } => {
                "Could not reach the marketplace backend".to_string()
            }
            MarketError::NotFound { entity, .. } => format!("{} not found", entity),
            MarketError::Unauthenticated => "Please sign in first".to_string(),
            MarketError::InvalidEmailDomain { domain, .. } => {
                format!("Please use your @{} email", domain)
            }
            MarketError::AuthenticationFailed { .. } => "Invalid email or password".to_string(),
            MarketError::ValidationError { field, message } => format!("{}: {}", field, message),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the backend URL and API key, then try again",
            ErrorCategory::Configuration => "Fix the configuration file or command-line flags",
            ErrorCategory::Data => "Check the input data for malformed records",
            ErrorCategory::Auth => "Sign in with an institutional account",
            ErrorCategory::NotFound => "The item may have been removed; browse the catalog again",
        }
    }

    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        MarketError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        MarketError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_low_severity() {
        let err = MarketError::not_found("Listing", "42");
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.to_string(), "Listing '42' not found");
        assert_eq!(err.user_friendly_message(), "Listing not found");
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = MarketError::MissingConfigError {
            field: "backend.url".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_email_domain_message() {
        let err = MarketError::InvalidEmailDomain {
            email: "a@gmail.com".to_string(),
            domain: "queensu.ca".to_string(),
        };
        assert_eq!(err.user_friendly_message(), "Please use your @queensu.ca email");
        assert_eq!(err.category(), ErrorCategory::Auth);
    }
}
