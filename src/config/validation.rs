use crate::config::types::{ApiConfig, Config, OutputConfig, RateLimitConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    // Method names are appended directly
    if !config.base_url.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must end with '/'",
            config.base_url
        )));
    }

    if config.token_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "token_env cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates rate limit configuration
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.window_size < 1 {
        return Err(ConfigError::Validation(format!(
            "window_size must be >= 1, got {}",
            config.window_size
        )));
    }

    if config.interval_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "interval_secs must be >= 1, got {}",
            config.interval_secs
        )));
    }

    // A clamped sleep could release a call before the window has moved on
    match config.interval_secs.checked_add(config.margin_secs) {
        Some(total) if total <= config.max_sleep_secs => {}
        total => {
            let total = total.map_or_else(|| "overflow".to_string(), |t| t.to_string());
            return Err(ConfigError::Validation(format!(
                "interval_secs + margin_secs ({}) must not exceed max_sleep_secs ({})",
                total, config.max_sleep_secs
            )));
        }
    }

    if config.retry_delay_secs < 1 {
        return Err(ConfigError::Validation(
            "retry_delay_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.archive_root.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "archive_root cannot be empty".to_string(),
        ));
    }

    if config.channels_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "channels_file cannot be empty".to_string(),
        ));
    }

    if config.template_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "template_file cannot be empty".to_string(),
        ));
    }

    Ok(())
}
