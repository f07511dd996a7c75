use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(assistant::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(assistant::config))]
    Config(String),

    #[error("Server error: {0}")]
    #[diagnostic(code(assistant::server))]
    Server(String),

    #[error(transparent)]
    #[diagnostic(code(assistant::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(assistant::serialization))]
    Serialization(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AssistantResult<T> = Result<T, Error>;

/// Helper to create errors for unparseable environment variables
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid value in environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create server errors
pub fn server_error(message: &str) -> Error {
    Error::Server(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn test_toml_error_becomes_serialization() {
        let err: Error = toml::from_str::<toml::Value>("port = ").unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
        assert_eq!(
            err.code().map(|code| code.to_string()).as_deref(),
            Some("assistant::serialization")
        );
    }

    #[test]
    fn test_helper_messages() {
        assert_eq!(
            env_error("PORT").to_string(),
            "Environment error: Invalid value in environment variable: PORT"
        );
        assert_eq!(
            config_error("bad zone").to_string(),
            "Configuration error: bad zone"
        );
    }
}
