use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Public CORS proxies tried by the fan-out fetch path when
/// `AFFLINK_PROXY_ENDPOINTS` is not set. `{url}` receives the encoded target.
pub const DEFAULT_PROXY_ENDPOINTS: &str = "https://api.allorigins.win/raw?url={url},\
https://corsproxy.io/?url={url},\
https://api.codetabs.com/v1/proxy?quest={url}";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
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

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected a boolean, got \"{other}\""),
            }),
        }
    };

    let env = parse_environment(&or_default("AFFLINK_ENV", "development"))?;
    let bind_addr = parse_addr("AFFLINK_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("AFFLINK_LOG_LEVEL", "info");

    let marketplace_domain = or_default("AFFLINK_MARKETPLACE_DOMAIN", "www.amazon.es");
    let affiliate_tag = lookup("AFFLINK_AFFILIATE_TAG")
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let scraper_api_keys = split_list(&or_default("AFFLINK_SCRAPER_API_KEYS", ""));
    let scraper_endpoint = or_default("AFFLINK_SCRAPER_ENDPOINT", "https://api.scraperapi.com/");
    let scraper_key_param = or_default("AFFLINK_SCRAPER_KEY_PARAM", "api_key");
    let scraper_url_param = or_default("AFFLINK_SCRAPER_URL_PARAM", "url");
    let scraper_request_timeout_secs = parse_u64("AFFLINK_SCRAPER_REQUEST_TIMEOUT_SECS", "60")?;
    let scraper_user_agent = or_default(
        "AFFLINK_SCRAPER_USER_AGENT",
        "afflink/0.1 (+affiliate-tool)",
    );
    let rotate_on_network_error = parse_bool("AFFLINK_ROTATE_ON_NETWORK_ERROR", "false")?;

    let proxy_endpoints = split_list(&or_default(
        "AFFLINK_PROXY_ENDPOINTS",
        DEFAULT_PROXY_ENDPOINTS,
    ));
    let proxy_attempt_timeout_secs = parse_u64("AFFLINK_PROXY_ATTEMPT_TIMEOUT_SECS", "20")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        marketplace_domain,
        affiliate_tag,
        scraper_api_keys,
        scraper_endpoint,
        scraper_key_param,
        scraper_url_param,
        scraper_request_timeout_secs,
        scraper_user_agent,
        rotate_on_network_error,
        proxy_endpoints,
        proxy_attempt_timeout_secs,
    })
}

/// Splits a comma-separated env value, dropping blank entries.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AFFLINK_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
