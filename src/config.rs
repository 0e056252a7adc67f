#![allow(dead_code)]

use std::env;

use chrono_tz::Tz;

use crate::services::pricing::{RateTable, SeasonRates};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub environment: String,
    pub api_prefix: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub trusted_hosts: Vec<String>,
    pub rate_limit_enabled: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst_size: u32,
    pub quote_author: String,
    pub venue_timezone: Tz,
    pub default_channel_label: String,
    pub default_commission_rate: f64,
    pub sheet_endpoint_url: Option<String>,
    pub sheet_api_key: Option<String>,
    pub ical_feed_url: Option<String>,
    pub availability_cache_ttl_seconds: u64,
    pub availability_fetch_timeout_seconds: u64,
    pub rate_table: RateTable,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            app_name: env_or("APP_NAME", "Rocca Quotes API"),
            environment: env_or("ENVIRONMENT", "development"),
            api_prefix: normalize_prefix(&env_or("API_PREFIX", "/v1")),
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse_or("PORT", 8000),
            cors_origins: parse_csv(&env_or("CORS_ORIGINS", "http://localhost:3000")),
            trusted_hosts: parse_csv(&env_or("TRUSTED_HOSTS", "localhost,127.0.0.1")),
            rate_limit_enabled: env_parse_bool_or("RATE_LIMIT_ENABLED", true),
            rate_limit_per_second: env_parse_or("RATE_LIMIT_PER_SECOND", 10),
            rate_limit_burst_size: env_parse_or("RATE_LIMIT_BURST_SIZE", 100),
            quote_author: env_or("QUOTE_AUTHOR", "backoffice"),
            venue_timezone: parse_timezone(&env_or("VENUE_TIMEZONE", "Europe/Rome")),
            default_channel_label: env_or("DEFAULT_CHANNEL_LABEL", "direct"),
            default_commission_rate: env_parse_or("DEFAULT_COMMISSION_RATE", 0.18),
            sheet_endpoint_url: env_opt("SHEET_ENDPOINT_URL"),
            sheet_api_key: env_opt("SHEET_API_KEY"),
            ical_feed_url: env_opt("ICAL_FEED_URL"),
            availability_cache_ttl_seconds: env_parse_or("AVAILABILITY_CACHE_TTL_SECONDS", 300),
            availability_fetch_timeout_seconds: env_parse_or(
                "AVAILABILITY_FETCH_TIMEOUT_SECONDS",
                20,
            ),
            rate_table: rate_table_from_env(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.trim().eq_ignore_ascii_case("production")
    }

    pub fn sheet_sink_configured(&self) -> bool {
        self.sheet_endpoint_url.is_some()
    }
}

/// The rate table ships with the house defaults; every number can be
/// overridden per deployment without a rebuild.
fn rate_table_from_env() -> RateTable {
    let defaults = RateTable::default();
    RateTable {
        high: season_rates_from_env("HIGH", defaults.high),
        mid: season_rates_from_env("MID", defaults.mid),
        low: season_rates_from_env("LOW", defaults.low),
        extra_guest_fee: env_parse_or("EXTRA_GUEST_FEE", defaults.extra_guest_fee),
        cleaning_fee: env_parse_or("CLEANING_FEE", defaults.cleaning_fee),
        min_stay_nights: env_parse_or("MIN_STAY_NIGHTS", defaults.min_stay_nights),
        long_stay_nights: env_parse_or("LONG_STAY_NIGHTS", defaults.long_stay_nights),
        long_stay_discount: env_parse_or("LONG_STAY_DISCOUNT", defaults.long_stay_discount),
    }
}

fn season_rates_from_env(prefix: &str, defaults: SeasonRates) -> SeasonRates {
    SeasonRates {
        base_nightly: env_parse_or(&format!("{prefix}_BASE_NIGHTLY"), defaults.base_nightly),
        weekend_nightly: env_parse_or(
            &format!("{prefix}_WEEKEND_NIGHTLY"),
            defaults.weekend_nightly,
        ),
        base_occupancy: env_parse_or(&format!("{prefix}_BASE_OCCUPANCY"), defaults.base_occupancy),
        max_occupancy: env_parse_or(&format!("{prefix}_MAX_OCCUPANCY"), defaults.max_occupancy),
    }
}

fn parse_timezone(raw: &str) -> Tz {
    match raw.trim().parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            tracing::warn!(timezone = %raw, "Unknown VENUE_TIMEZONE, falling back to Europe/Rome");
            chrono_tz::Europe::Rome
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    env_opt(key)
        .and_then(|raw| raw.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_parse_bool_or(key: &str, default: bool) -> bool {
    match env_opt(key).as_deref().map(str::to_ascii_lowercase) {
        Some(value) if value == "1" || value == "true" || value == "yes" || value == "on" => true,
        Some(value) if value == "0" || value == "false" || value == "no" || value == "off" => false,
        Some(_) => default,
        None => default,
    }
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn normalize_prefix(raw: &str) -> String {
    let mut prefix = raw.trim().to_string();
    if prefix.is_empty() {
        return "/v1".to_string();
    }
    if !prefix.starts_with('/') {
        prefix.insert(0, '/');
    }
    while prefix.ends_with('/') && prefix.len() > 1 {
        prefix.pop();
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::{normalize_prefix, parse_csv, parse_timezone};

    #[test]
    fn normalizes_prefix() {
        assert_eq!(normalize_prefix("v1"), "/v1");
        assert_eq!(normalize_prefix("/v1/"), "/v1");
        assert_eq!(normalize_prefix(""), "/v1");
    }

    #[test]
    fn splits_csv_and_drops_blanks() {
        assert_eq!(
            parse_csv("a, b,,c "),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn unknown_timezone_falls_back_to_rome() {
        assert_eq!(parse_timezone("Mars/Olympus"), chrono_tz::Europe::Rome);
        assert_eq!(parse_timezone("Europe/Lisbon"), chrono_tz::Europe::Lisbon);
    }
}
