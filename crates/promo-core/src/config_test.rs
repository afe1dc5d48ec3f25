use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "PROMO_ENV"));
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.http_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "promo-widget/0.1");
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_base_ms, 1000);
    assert_eq!(cfg.product_limit, 300);
    assert_eq!(cfg.refresh_interval_secs, 600);
    assert_eq!(cfg.coupon_reload_delay_ms, 1000);
    assert_eq!(cfg.storage_path.to_str(), Some("./.promo-cache.json"));
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("PROMO_ENV", "production");
    map.insert("PROMO_MAX_RETRIES", "5");
    map.insert("PROMO_RETRY_BACKOFF_BASE_MS", "250");
    map.insert("PROMO_PRODUCT_LIMIT", "40");
    map.insert("PROMO_STORAGE_PATH", "/tmp/widget.json");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Production);
    assert_eq!(cfg.max_retries, 5);
    assert_eq!(cfg.retry_backoff_base_ms, 250);
    assert_eq!(cfg.product_limit, 40);
    assert_eq!(cfg.storage_path.to_str(), Some("/tmp/widget.json"));
}

#[test]
fn build_app_config_rejects_non_numeric_retries() {
    let mut map = HashMap::new();
    map.insert("PROMO_MAX_RETRIES", "lots");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PROMO_MAX_RETRIES"),
        "expected InvalidEnvVar(PROMO_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_product_limit() {
    let mut map = HashMap::new();
    map.insert("PROMO_PRODUCT_LIMIT", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PROMO_PRODUCT_LIMIT"),
        "expected InvalidEnvVar(PROMO_PRODUCT_LIMIT), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_refresh_interval() {
    let mut map = HashMap::new();
    map.insert("PROMO_REFRESH_INTERVAL_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PROMO_REFRESH_INTERVAL_SECS"),
        "expected InvalidEnvVar(PROMO_REFRESH_INTERVAL_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_invalid_timeout() {
    let mut map = HashMap::new();
    map.insert("PROMO_HTTP_TIMEOUT_SECS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PROMO_HTTP_TIMEOUT_SECS"),
        "expected InvalidEnvVar(PROMO_HTTP_TIMEOUT_SECS), got: {result:?}"
    );
}
