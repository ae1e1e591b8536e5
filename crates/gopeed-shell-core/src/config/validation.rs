use crate::config::types::ShellConfig;
use crate::errors::ConfigError;

/// Validate a fully merged configuration.
///
/// Window geometry is not checked here. A window the host cannot create
/// fails at window creation instead.
pub fn validate_config(config: &ShellConfig) -> Result<(), ConfigError> {
    if config.instance.title.trim().is_empty() {
        return Err(invalid("instance.title cannot be empty"));
    }

    if config.ipc.request_timeout_ms == 0 {
        return Err(invalid("ipc.request_timeout_ms must be greater than 0"));
    }

    if config.engine.start_timeout_ms == 0 {
        return Err(invalid("engine.start_timeout_ms must be greater than 0"));
    }

    if config.engine.stop_timeout_ms == 0 {
        return Err(invalid("engine.stop_timeout_ms must be greater than 0"));
    }

    if let Some(command) = &config.engine.command
        && command.trim().is_empty()
    {
        return Err(invalid("engine.command cannot be empty when set"));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::InvalidConfiguration {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ShellConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut config = ShellConfig::default();
        config.instance.title = "   ".to_string();

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("instance.title"));
    }

    #[test]
    fn test_zero_request_timeout_rejected() {
        let mut config = ShellConfig::default();
        config.ipc.request_timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_stop_timeout_rejected() {
        let mut config = ShellConfig::default();
        config.engine.stop_timeout_ms = 0;

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("engine.stop_timeout_ms"));
    }

    #[test]
    fn test_blank_engine_command_rejected() {
        let mut config = ShellConfig::default();
        config.engine.command = Some(String::new());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_window_size_is_left_to_the_host() {
        let mut config = ShellConfig::default();
        config.window.width = 0;
        assert!(validate_config(&config).is_ok());
    }
}
