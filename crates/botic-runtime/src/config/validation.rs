//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BoticConfig, LogOutput, LoggingConfig};
use botic_framework::RouterConfig;

/// Validates the entire configuration.
pub fn validate_config(config: &BoticConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_router_config(&config.router)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.max_files == 0 {
        return Err(ConfigError::validation(
            "logging.max_files must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_router_config(router: &RouterConfig) -> ConfigResult<()> {
    if router.help_command.is_empty() {
        return Err(ConfigError::missing_field("router.help_command"));
    }

    if router.help_command.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Help command name cannot contain whitespace: {:?}",
            router.help_command
        )));
    }

    Ok(())
}
