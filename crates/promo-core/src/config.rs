use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("PROMO_ENV", "development"))?;
    let log_level = or_default("PROMO_LOG_LEVEL", "info");

    let http_timeout_secs = parse_u64("PROMO_HTTP_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("PROMO_USER_AGENT", "promo-widget/0.1");
    let max_retries = parse_u32("PROMO_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("PROMO_RETRY_BACKOFF_BASE_MS", "1000")?;
    let product_limit = parse_u32("PROMO_PRODUCT_LIMIT", "300")?;
    if product_limit == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PROMO_PRODUCT_LIMIT".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let refresh_interval_secs = parse_u64("PROMO_REFRESH_INTERVAL_SECS", "600")?;
    if refresh_interval_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PROMO_REFRESH_INTERVAL_SECS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let coupon_reload_delay_ms = parse_u64("PROMO_COUPON_RELOAD_DELAY_MS", "1000")?;
    let storage_path = PathBuf::from(or_default("PROMO_STORAGE_PATH", "./.promo-cache.json"));

    Ok(AppConfig {
        env,
        log_level,
        http_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        product_limit,
        refresh_interval_secs,
        coupon_reload_delay_ms,
        storage_path,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PROMO_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
