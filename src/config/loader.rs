//! Configuration loading from disk.

use std::path::Path;
use std::fs;
use crate::config::schema::DashboardConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<DashboardConfig, ConfigError> {
    let config: DashboardConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DashboardConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Startup configuration: the file at `path` (or the built-in defaults) with
/// the bind override applied, validated once as a whole.
pub fn resolve_config(path: Option<&Path>, bind: Option<String>) -> Result<DashboardConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => DashboardConfig::default(),
    };
    if let Some(bind) = bind {
        config.listener.bind_address = bind;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [listener]
            bind_address = "127.0.0.1:5050"

            [charts]
            start_date = "2020-04-01"
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:5050");
        assert_eq!(config.charts.start_date.to_string(), "2020-04-01");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_values_report_every_problem() {
        let err = parse_config(
            r#"
            [cache]
            ttl_secs = 0

            [charts]
            rolling_window = 0
            "#,
        )
        .unwrap_err();

        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_resolve_validates_defaults_after_override() {
        assert!(resolve_config(None, None).is_ok());

        let err = resolve_config(None, Some("not-an-address".to_string())).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::BindAddress("not-an-address".to_string())]);
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_resolve_override_repairs_file_bind_address() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [listener]
            bind_address = "nowhere"
            "#
        )
        .unwrap();

        assert!(matches!(load_config(file.path()), Err(ConfigError::Validation(_))));

        let config = resolve_config(Some(file.path()), Some("127.0.0.1:5050".to_string())).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:5050");
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let config = parse_config(include_str!("../../dashboard.toml")).unwrap();
        let defaults = DashboardConfig::default();

        assert_eq!(config.listener.bind_address, defaults.listener.bind_address);
        assert_eq!(config.cache.ttl_secs, defaults.cache.ttl_secs);
        assert_eq!(config.sources.country_timeline_url, defaults.sources.country_timeline_url);
        assert_eq!(config.charts.start_date, defaults.charts.start_date);
        assert!(!config.admin.enabled);
    }
}
