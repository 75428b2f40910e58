use crate::config::types::{
    Config, CrawlerConfig, NormalizeConfig, RateLimitConfig, StorageConfig, SyncConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_storage_config(&config.storage)?;
    validate_normalize_config(&config.normalize)?;
    validate_sync_config(&config.sync)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_http_url("start-url", &config.start_url)?;

    if let Some(base) = &config.base_url {
        validate_http_url("base-url", base)?;
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_images < 1 {
        return Err(ConfigError::Validation(format!(
            "max-images must be >= 1, got {}",
            config.max_images
        )));
    }

    Ok(())
}

/// Validates cooldown configuration
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be >= 1, got {}",
            config.batch_size
        )));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.ledger_path.is_empty() {
        return Err(ConfigError::Validation(
            "ledger-path cannot be empty".to_string(),
        ));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates normalization policy overrides
fn validate_normalize_config(config: &NormalizeConfig) -> Result<(), ConfigError> {
    if config.min_price >= config.max_price {
        return Err(ConfigError::Validation(format!(
            "min-price ({}) must be below max-price ({})",
            config.min_price, config.max_price
        )));
    }

    if config.mileage_scale_below > 0 && config.mileage_scale_factor == 0 {
        return Err(ConfigError::Validation(
            "mileage-scale-factor cannot be 0 while scaling is enabled".to_string(),
        ));
    }

    for entry in &config.brands {
        if entry.token.trim().is_empty() || entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand entries need a non-empty token and name, got token='{}' name='{}'",
                entry.token, entry.name
            )));
        }
    }

    Ok(())
}

/// Validates downstream endpoints
fn validate_sync_config(config: &SyncConfig) -> Result<(), ConfigError> {
    validate_http_url("sync.endpoint", &config.endpoint)?;
    validate_http_url("sync.summary-endpoint", &config.summary_endpoint)?;

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "sync.request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates that a URL parses and uses http or https
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}
