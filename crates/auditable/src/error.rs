//! Audit Error Types

use thiserror::Error;

use crate::validation::Errors;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Invalid audit configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Undefined method `{method}` for {model}")]
    UndefinedMethod { model: String, method: String },

    #[error("Invalid audit message from `{source_name}` on {model}: {message}")]
    InvalidMessage {
        model: String,
        source_name: String,
        message: String,
    },

    #[error("Validation failed for {model}: {}", .errors.full_messages().join(", "))]
    Invalid { model: String, errors: Errors },

    #[error("Audit registration not found: {key}")]
    RegistrationNotFound { key: String },

    #[error("Callback failed: {message}")]
    Callback { message: String },

    #[error("Audit store error: {message}")]
    Store { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] auditable_config::ConfigError),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AuditError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration { message: message.into() }
    }

    pub fn undefined_method(model: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UndefinedMethod {
            model: model.into(),
            method: method.into(),
        }
    }

    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback { message: message.into() }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store { message: message.into() }
    }

    /// Validation errors carried by an `Invalid` error
    pub fn validation_errors(&self) -> Option<&Errors> {
        match self {
            Self::Invalid { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
