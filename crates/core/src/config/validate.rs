use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Platform base_url is present and http(s)
/// - Platform timeout and page size are positive
/// - At least one slot is taken per program
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let base_url = config.platform.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "platform.base_url is required".to_string(),
        ));
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "platform.base_url must be an http(s) URL, got '{}'",
            base_url
        )));
    }
    if config.platform.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "platform.timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.platform.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "platform.page_size cannot be 0".to_string(),
        ));
    }

    if config.integration.max_slots_per_program == 0 {
        return Err(ConfigError::ValidationError(
            "integration.max_slots_per_program cannot be 0".to_string(),
        ));
    }

    Ok(())
}
