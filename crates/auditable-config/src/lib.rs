//! Auditable Configuration System
//!
//! TOML-based configuration with environment variable override support.
//! Covers logging, the auditor validation rule, the audits association,
//! the audit store and audit rules declared per model.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub logging: LoggingConfig,
    pub validation: ValidationConfig,
    pub association: AssociationConfig,
    pub store: StoreConfig,

    /// Audit rules declared in configuration rather than in code
    pub rules: Vec<RuleConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// "json" or "text"
    pub format: String,
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            level: "info".to_string(),
        }
    }
}

/// Which audit rules make an auditor mandatory when a record is validated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditorPolicy {
    /// Any rule whose condition holds, whatever event it is bound to
    #[default]
    AnyRule,
    /// Only rules bound to events still to fire during the current save
    UpcomingEvents,
}

/// Auditor presence validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub auditor_message: String,
    pub policy: AuditorPolicy,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            auditor_message: "needs to be assigned".to_string(),
            policy: AuditorPolicy::AnyRule,
        }
    }
}

/// Sort direction of the audits association
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Audit column the audits association is ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderColumn {
    Id,
    Message,
    Auditor,
    #[default]
    CreatedAt,
}

impl OrderColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderColumn::Id => "id",
            OrderColumn::Message => "message",
            OrderColumn::Auditor => "auditor",
            OrderColumn::CreatedAt => "created_at",
        }
    }
}

impl std::fmt::Display for OrderColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The has-many association from an audited model to its audits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationConfig {
    pub name: String,
    /// Name of the polymorphic back-reference on the audit side
    pub polymorphic_as: String,
    pub order_column: OrderColumn,
    pub order_direction: SortDirection,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            name: "audits".to_string(),
            polymorphic_as: "auditable".to_string(),
            order_column: OrderColumn::CreatedAt,
            order_direction: SortDirection::Desc,
        }
    }
}

/// Audit store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// "memory" or "sqlite"
    pub kind: String,
    pub database_url: String,
    pub table: String,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: "memory".to_string(),
            database_url: "sqlite::memory:".to_string(),
            table: "audits".to_string(),
            max_connections: 1,
        }
    }
}

pub const STORE_KINDS: &[&str] = &["memory", "sqlite"];

/// An audit rule declared in TOML.
///
/// `if` and `with_message` name methods resolved on the model at event time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub model: String,
    pub when: String,
    #[serde(rename = "if")]
    pub condition: String,
    pub with_message: String,
}

impl RuleConfig {
    /// Option pairs in the shape `audit` accepts from symbolic input
    pub fn options(&self) -> Vec<(&str, &str)> {
        vec![
            ("when", self.when.as_str()),
            ("if", self.condition.as_str()),
            ("with_message", self.with_message.as_str()),
        ]
    }
}

impl AuditConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AuditConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validation.auditor_message.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "validation.auditor_message must not be empty".to_string(),
            ));
        }
        if self.association.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "association.name must not be empty".to_string(),
            ));
        }
        if !STORE_KINDS.contains(&self.store.kind.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "store.kind must be one of {:?}, got {:?}",
                STORE_KINDS, self.store.kind
            )));
        }
        for rule in &self.rules {
            if rule.model.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "rules[].model must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Rules declared for one model type
    pub fn rules_for<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a RuleConfig> + 'a {
        self.rules.iter().filter(move |rule| rule.model == model)
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Auditable Configuration
# Environment variables override these settings

[logging]
format = "text"  # text or json
level = "info"

[validation]
auditor_message = "needs to be assigned"
policy = "any_rule"  # any_rule or upcoming_events

[association]
name = "audits"
polymorphic_as = "auditable"
order_column = "created_at"  # created_at, message, auditor or id
order_direction = "desc"

[store]
kind = "memory"  # memory or sqlite
database_url = "sqlite::memory:"
table = "audits"
max_connections = 1

[[rules]]
model = "Article"
when = "before_update"
if = "published?"
with_message = "publish_message"
"#
        .to_string()
    }
}
