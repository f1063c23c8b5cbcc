use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Retry budget allows at least one attempt
/// - Lookup deadline, when set, is not 0
/// - Channel buffers are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.tracking.max_retries == 0 {
        return Err(ConfigError::ValidationError(
            "tracking.max_retries must be at least 1".to_string(),
        ));
    }

    if config.lookup.deadline_ms == Some(0) {
        return Err(ConfigError::ValidationError(
            "lookup.deadline_ms cannot be 0".to_string(),
        ));
    }

    if config.runner.command_buffer == 0 || config.runner.frame_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "runner buffers cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServerConfig, TrackingConfig};
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_retries_fails() {
        let config = Config {
            tracking: TrackingConfig {
                max_retries: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_zero_deadline_fails() {
        let mut config = Config::default();
        config.lookup.deadline_ms = Some(0);
        assert!(validate_config(&config).is_err());

        config.lookup.deadline_ms = Some(1);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_buffer_fails() {
        let mut config = Config::default();
        config.runner.command_buffer = 0;
        assert!(validate_config(&config).is_err());
    }
}
