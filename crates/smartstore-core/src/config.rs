use thiserror::Error;

use crate::app_config::AppConfig;

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a set env var cannot be parsed. Unset vars fall
/// back to defaults.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a set env var cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup — no
/// `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = AppConfig::default();

    let parse_u32 = |var: &str, default: u32| -> Result<u32, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_owned(),
                reason: e.to_string(),
            }),
            Err(_) => Ok(default),
        }
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_owned(),
                reason: e.to_string(),
            }),
            Err(_) => Ok(default),
        }
    };

    let parse_usize = |var: &str, default: usize| -> Result<usize, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|e| ConfigError::InvalidEnvVar {
                    var: var.to_owned(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Ok(raw) => match raw.as_str() {
                "1" | "true" | "yes" => Ok(true),
                "0" | "false" | "no" => Ok(false),
                other => Err(ConfigError::InvalidEnvVar {
                    var: var.to_owned(),
                    reason: format!("expected a boolean, got \"{other}\""),
                }),
            },
            Err(_) => Ok(default),
        }
    };

    Ok(AppConfig {
        request_timeout_secs: parse_u64("SCRAPER_TIMEOUT_SECS", defaults.request_timeout_secs)?,
        max_retries: parse_u32("SCRAPER_MAX_RETRIES", defaults.max_retries)?,
        base_retry_delay_ms: parse_u64(
            "SCRAPER_BASE_RETRY_DELAY_MS",
            defaults.base_retry_delay_ms,
        )?,
        max_images: parse_usize("SCRAPER_MAX_IMAGES", defaults.max_images)?,
        max_description_len: parse_usize(
            "SCRAPER_MAX_DESCRIPTION_LEN",
            defaults.max_description_len,
        )?,
        batch_delay_ms: parse_u64("SCRAPER_BATCH_DELAY_MS", defaults.batch_delay_ms)?,
        extract_specifications: parse_bool(
            "SCRAPER_EXTRACT_SPECS",
            defaults.extract_specifications,
        )?,
        establish_session: parse_bool("SCRAPER_ESTABLISH_SESSION", defaults.establish_session)?,
        log_level: lookup("SCRAPER_LOG_LEVEL").unwrap_or(defaults.log_level),
    })
}
