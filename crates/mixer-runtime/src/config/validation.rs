//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, MixerSettings, RoutingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &MixerSettings) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_routing_config(&config.routing)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    for module in logging.filters.keys() {
        if module.trim().is_empty() {
            return Err(ConfigError::validation("Log filter module name is empty"));
        }
    }

    Ok(())
}

fn validate_routing_config(routing: &RoutingConfig) -> ConfigResult<()> {
    if routing.timeout_ms == Some(0) {
        return Err(ConfigError::validation(
            "Routing timeout must be greater than 0 (omit it to disable)",
        ));
    }

    if routing.concurrency == 0 {
        return Err(ConfigError::validation(
            "Routing concurrency must be greater than 0",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = MixerSettings::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = MixerSettings::default();
        config.routing.timeout_ms = Some(0);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let mut config = MixerSettings::default();
        config.routing.concurrency = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_file_output_without_path() {
        let mut config = MixerSettings::default();
        config.logging.output = LogOutput::File;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::MissingField { ref field }) if field == "logging.file_path"));
    }
}
