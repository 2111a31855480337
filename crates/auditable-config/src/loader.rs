//! Configuration loader with file and environment variable support

use crate::{AuditConfig, AuditorPolicy, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "auditable.toml",
    "./config/auditable.toml",
    "/etc/auditable/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AuditConfig, ConfigError> {
        let mut config = AuditConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading audit configuration from file");
            config = AuditConfig::from_file(&path)?;
        }

        apply_env_overrides(&mut config, |key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Ok(path) = env::var("AUDITABLE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `AUDITABLE_*` overrides read through `lookup`.
fn apply_env_overrides<F>(config: &mut AuditConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // Logging
    if let Some(val) = lookup("AUDITABLE_LOG_FORMAT") {
        config.logging.format = val;
    }
    if let Some(val) = lookup("AUDITABLE_LOG_LEVEL") {
        config.logging.level = val;
    }

    // Validation
    if let Some(val) = lookup("AUDITABLE_AUDITOR_MESSAGE") {
        config.validation.auditor_message = val;
    }
    if let Some(val) = lookup("AUDITABLE_AUDITOR_POLICY") {
        config.validation.policy = match val.as_str() {
            "any_rule" => AuditorPolicy::AnyRule,
            "upcoming_events" => AuditorPolicy::UpcomingEvents,
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "AUDITABLE_AUDITOR_POLICY: unknown policy {other:?}"
                )))
            }
        };
    }

    // Store
    if let Some(val) = lookup("AUDITABLE_STORE_KIND") {
        config.store.kind = val;
    }
    if let Some(val) = lookup("AUDITABLE_DATABASE_URL") {
        config.store.database_url = val;
    }
    if let Some(val) = lookup("AUDITABLE_STORE_TABLE") {
        config.store.table = val;
    }
    if let Some(val) = lookup("AUDITABLE_STORE_MAX_CONNECTIONS") {
        if let Ok(max) = val.parse() {
            config.store.max_connections = max;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\ntable = \"model_audits\"").unwrap();

        let config = ConfigLoader::with_path(file.path()).load().unwrap();
        assert_eq!(config.store.table, "model_audits");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AuditConfig::default();
        let lookup = lookup_from(&[
            ("AUDITABLE_LOG_FORMAT", "json"),
            ("AUDITABLE_AUDITOR_POLICY", "upcoming_events"),
            ("AUDITABLE_STORE_KIND", "sqlite"),
            ("AUDITABLE_STORE_MAX_CONNECTIONS", "4"),
        ]);

        apply_env_overrides(&mut config, lookup).unwrap();

        assert_eq!(config.logging.format, "json");
        assert_eq!(config.validation.policy, AuditorPolicy::UpcomingEvents);
        assert_eq!(config.store.kind, "sqlite");
        assert_eq!(config.store.max_connections, 4);
    }

    #[test]
    fn test_unparseable_number_is_ignored() {
        let mut config = AuditConfig::default();
        let lookup = lookup_from(&[("AUDITABLE_STORE_MAX_CONNECTIONS", "many")]);
        apply_env_overrides(&mut config, lookup).unwrap();
        assert_eq!(config.store.max_connections, 1);
    }

    #[test]
    fn test_unknown_policy_is_an_error() {
        let mut config = AuditConfig::default();
        let lookup = lookup_from(&[("AUDITABLE_AUDITOR_POLICY", "never")]);
        let err = apply_env_overrides(&mut config, lookup).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
